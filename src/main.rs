use dns_subnet_allocator::cli::Command;
use dns_subnet_allocator::config::Config;
use dns_subnet_allocator::load_inventory;
use dns_subnet_allocator::store::write_inventory;
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    // Do as little as possible in main.rs as it can't contain any tests
    log4rs::init_file("log4rs.yml", Default::default()).expect("Error initializing log4rs");
    dotenv::dotenv().ok();
    //
    log::info!("#Start main()");

    let config = Config::from_env()?;
    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = Command::parse(&args)?;

    let mut store = load_inventory(None, &config)?;
    let outcome = command.execute(&mut store, &config)?;
    for message in &outcome.messages {
        println!("{message}");
    }
    if outcome.modified {
        write_inventory(&config.inventory_file, &store)?;
    }

    log::info!("#End main()");
    Ok(())
}
