//! Controller statistics collection and reporting.
//!
//! Tracks command counts, refresh behavior, and how client words were routed
//! (straight through, or staged in the device).

use serde::Serialize;
use std::time::Instant;

/// Controller statistics tracking all performance metrics.
#[derive(Debug, Clone, Serialize)]
pub struct ControllerStats {
    #[serde(skip)]
    start_time: Instant,
    pub cycles: u64,

    pub activates: u64,
    pub read_bursts: u64,
    pub write_bursts: u64,

    pub refreshes: u64,
    pub refresh_episodes: u64,
    pub lapses: u64,

    pub bypass_words: u64,
    pub words_to_device: u64,
    pub words_from_device: u64,
    /// Read beats delivered as zero because the device left the bus undriven.
    pub undriven_reads: u64,
    pub write_turns: u64,
    pub read_turns: u64,

    pub cycles_init: u64,
    pub cycles_burst: u64,
    pub cycles_refresh: u64,
    pub cycles_idle: u64,
}

impl Default for ControllerStats {
    fn default() -> Self {
        Self {
            start_time: Instant::now(),
            cycles: 0,
            activates: 0,
            read_bursts: 0,
            write_bursts: 0,
            refreshes: 0,
            refresh_episodes: 0,
            lapses: 0,
            bypass_words: 0,
            words_to_device: 0,
            words_from_device: 0,
            undriven_reads: 0,
            write_turns: 0,
            read_turns: 0,
            cycles_init: 0,
            cycles_burst: 0,
            cycles_refresh: 0,
            cycles_idle: 0,
        }
    }
}

impl ControllerStats {
    /// Renders the statistics as a JSON object.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Prints a formatted summary of all controller statistics.
    pub fn print(&self) {
        let seconds = self.start_time.elapsed().as_secs_f64();
        let cyc = self.cycles.max(1);
        let khz = (self.cycles as f64 / seconds) / 1000.0;
        let pct = |n: u64| (n as f64 / cyc as f64) * 100.0;

        println!("\n==========================================================");
        println!("SDRAM CONTROLLER STATISTICS");
        println!("==========================================================");
        println!("host_seconds             {:.4} s", seconds);
        println!("sim_cycles               {}", self.cycles);
        println!("sim_freq                 {:.2} kHz", khz);
        println!("----------------------------------------------------------");
        println!("BUS OCCUPANCY");
        println!(
            "  cycles.init            {} ({:.2}%)",
            self.cycles_init,
            pct(self.cycles_init)
        );
        println!(
            "  cycles.burst           {} ({:.2}%)",
            self.cycles_burst,
            pct(self.cycles_burst)
        );
        println!(
            "  cycles.refresh         {} ({:.2}%)",
            self.cycles_refresh,
            pct(self.cycles_refresh)
        );
        println!(
            "  cycles.idle            {} ({:.2}%)",
            self.cycles_idle,
            pct(self.cycles_idle)
        );
        println!("----------------------------------------------------------");
        println!("COMMANDS");
        println!("  activate               {}", self.activates);
        println!("  read_bursts            {}", self.read_bursts);
        println!("  write_bursts           {}", self.write_bursts);
        println!("  refresh                {}", self.refreshes);
        println!("  refresh.episodes       {}", self.refresh_episodes);
        println!("  refresh.lapses         {}", self.lapses);
        println!("----------------------------------------------------------");
        println!("DATA PATH");
        println!("  turns.write            {}", self.write_turns);
        println!("  turns.read             {}", self.read_turns);
        println!("  words.bypass           {}", self.bypass_words);
        println!("  words.to_device        {}", self.words_to_device);
        println!("  words.from_device      {}", self.words_from_device);
        println!("  reads.undriven         {}", self.undriven_reads);
        println!("==========================================================");
    }
}
