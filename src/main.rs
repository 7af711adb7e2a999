//! SDRAM Controller Simulator CLI.
//!
//! Builds a controller wired to the behavioral SDRAM model, streams a
//! counting sequence through every channel, and checks that it comes back
//! intact and in order.

use clap::Parser;
use std::process;

use sdram_controller::config::{Config, Timing};
use sdram_controller::sim::{Pattern, Workload};
use sdram_controller::soc::System;

/// Command-line arguments for the SDRAM controller simulator.
#[derive(Parser, Debug)]
#[command(author, version, about = "Cycle-Accurate SDRAM Controller Simulator")]
struct Args {
    /// TOML configuration file (see `configs/default.toml`); built-in
    /// defaults when omitted.
    #[arg(short, long)]
    config: Option<String>,

    /// Override the number of client channels.
    #[arg(long)]
    channels: Option<usize>,

    /// Words streamed through each channel.
    #[arg(short, long, default_value_t = 4096)]
    words: u32,

    /// Write every word before reading any back.
    #[arg(long)]
    write_first: bool,

    /// Never grant refresh requests.
    #[arg(long)]
    withhold_refresh: bool,

    /// Print statistics as JSON.
    #[arg(long)]
    json: bool,

    /// Enable debug logging (or trace with `-vv`).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let args = Args::parse();

    let level = match args.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .parse_default_env()
        .init();

    let mut config = match &args.config {
        Some(path) => Config::load(path).unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            process::exit(2);
        }),
        None => Config::default(),
    };
    if let Some(count) = args.channels {
        config.channels.count = count;
    }
    if args.verbose > 1 {
        config.general.trace_commands = true;
    }

    let timing = Timing::from_config(&config).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        process::exit(2);
    });
    let mut system = System::new(&config).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        process::exit(2);
    });
    system.controller.set_refresh_permit(!args.withhold_refresh);

    if !args.json {
        print_banner(&config, &timing);
    }

    let pattern = if args.write_first {
        Pattern::WriteThenRead
    } else {
        Pattern::Interleaved
    };
    let mut workload = Workload::new(&system, args.words, pattern);
    let result = workload.run(&mut system, config.general.max_cycles);

    let stats = system.controller.stats();
    if args.json {
        match stats.to_json() {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("Error: {}", e),
        }
    } else {
        stats.print();
        let status = system.controller.status();
        println!("refresh_lapsed           {}", status.refresh_lapsed);
    }

    if let Err(e) = result {
        eprintln!("\n[!] {}", e);
        process::exit(1);
    }
}

fn print_banner(config: &Config, timing: &Timing) {
    let layout = config.layout();
    println!("Global Configuration");
    println!("--------------------");
    println!("Clock:");
    println!(
        "  Frequency:          {} MHz",
        config.clock.frequency_hz / 1_000_000
    );
    println!("Geometry:");
    println!(
        "  Banks/Rows/Cols:    {} / {} / {}",
        layout.banks(),
        1u64 << layout.row_bits,
        1u64 << layout.col_bits
    );
    println!("  Capacity:           {} words", layout.capacity_words());
    println!("Timing (cycles):");
    println!("  Startup:            {}", timing.startup);
    println!(
        "  tRCD/tRC/tRP/tMRD:  {} / {} / {} / {}",
        timing.t_rcd, timing.t_rc, timing.t_rp, timing.t_mrd
    );
    println!("  tWR:                {}", timing.t_wr);
    println!("  CAS Latency:        {}", timing.cas_latency);
    println!(
        "  Refresh:            every {} cycles, threshold {}",
        timing.refresh_increment, timing.refresh_threshold
    );
    println!("Bursts:");
    println!(
        "  Length x Turn:      {} x {} ({} cycles per burst)",
        timing.burst_length, timing.bursts_per_turn, timing.burst_cycles
    );
    println!("Channels:");
    println!("  Count:              {}", config.channels.count);
    println!("  Window:             {} words", config.channels.window_words);
    println!("  FIFO Depth:         {}", config.channels.fifo_depth);
    println!("--------------------");
}
