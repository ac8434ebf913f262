use std::io::{BufRead, Write};
use std::net::Ipv4Addr;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use delver::resolver::{Config, Resolver, ROOT_SERVER};
use delver::transport::DNS_PORT;

#[derive(Parser)]
#[command(name = "delver")]
#[command(about = "Iterative DNS resolver with a session-local server cache", long_about = None)]
struct Args {
    /// Root server to start every walk from
    #[arg(short, long, default_value_t = ROOT_SERVER)]
    root: Ipv4Addr,

    /// Destination UDP port
    #[arg(short, long, default_value_t = DNS_PORT)]
    port: u16,

    /// Per-query timeout in seconds
    #[arg(short, long, default_value_t = 2)]
    timeout: u64,
}

fn print_cache(resolver: &Resolver) {
    println!("----------\nCache:");
    for (i, entry) in resolver.cache().iter().enumerate() {
        println!("{}: {} has IPv4 {}", i + 1, entry.name, entry.address);
    }
    println!("----------");
}

fn remove_entry(resolver: &mut Resolver, arg: Option<&str>) {
    let index = arg.and_then(|s| s.parse::<usize>().ok());
    match index.and_then(|i| resolver.cache_mut().remove(i).map(|_| i)) {
        Some(i) => println!("Removed record {i}"),
        None => println!("Error: Enter valid index"),
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    // Resolution is strictly one-at-a-time, so a current-thread runtime
    // driven per call is all the concurrency this needs.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let mut resolver = runtime.block_on(Resolver::new(Config {
        root: args.root,
        port: args.port,
        timeout: Duration::from_secs(args.timeout),
    }))?;

    let stdin = std::io::stdin();
    let mut line = String::new();

    loop {
        print!("Enter a domain name or .exit > ");
        std::io::stdout().flush()?;

        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let input = line.trim();

        match input {
            "" => {}
            ".exit" => break,
            ".list" => print_cache(&resolver),
            ".clear" => {
                resolver.cache_mut().clear();
                println!("Cleared the cache");
            }
            _ if input.starts_with(".remove") => {
                remove_entry(&mut resolver, input.split_whitespace().nth(1));
            }
            name => match runtime.block_on(resolver.resolve(name)) {
                Ok(Some(address)) => println!("{address}"),
                Ok(None) => println!("No address data returned for {name}"),
                Err(err) => println!("Could not resolve {name}: {err}"),
            },
        }
    }

    Ok(())
}
