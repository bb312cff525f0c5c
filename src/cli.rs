//! Command-line argument parsing.

use clap::Parser;

use crate::params::{NetConfig, VolumePolicy};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "Glowroom")]
#[command(about = "Audio-reactive shared-presence room client", long_about = None)]
pub struct Args {
    /// Presence server origin (http:// or https://)
    #[arg(long, value_name = "ORIGIN", default_value = "http://localhost:8080")]
    pub server: String,

    /// Apply roster updates to the participant pool (false: log and discard)
    #[arg(long, value_name = "BOOL", default_value_t = true, action = clap::ArgAction::Set)]
    pub apply_roster: bool,

    /// Initial synth volume (0..20)
    #[arg(long, value_name = "LEVEL", default_value = "1.0")]
    pub volume: f32,
}

impl Args {
    /// Network configuration from command-line arguments
    pub fn net_config(&self) -> NetConfig {
        NetConfig {
            origin: self.server.clone(),
            apply_roster: self.apply_roster,
            ..NetConfig::default()
        }
    }

    /// Volume policy with the requested starting level clamped into range
    pub fn volume_policy(&self) -> VolumePolicy {
        let mut policy = VolumePolicy::default();
        policy.initial = self.volume.clamp(policy.min, policy.max);
        policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["glowroom"]);
        assert_eq!(args.server, "http://localhost:8080");
        assert!(args.apply_roster);
        assert_eq!(args.volume, 1.0);
    }

    #[test]
    fn test_roster_opt_out() {
        let args = Args::parse_from(["glowroom", "--apply-roster", "false"]);
        assert!(!args.apply_roster);
    }

    #[test]
    fn test_volume_is_clamped() {
        let args = Args::parse_from(["glowroom", "--volume", "999"]);
        let policy = args.volume_policy();
        assert_eq!(policy.initial, policy.max);
    }
}
