use crate::error::Result;
use crate::request::ArchiveRequest;
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace). `RUST_LOG` overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Package an OVF descriptor and its disk/resource files into an OVA.
    #[command(alias = "c")]
    Create {
        /// The OVF descriptor. Always stored as the first entry.
        #[arg(
            short = 'd',
            long = "ovf",
            required_unless_present = "request",
            conflicts_with = "request"
        )]
        ovf: Option<PathBuf>,

        /// The path for the output archive (e.g., appliance.ova).
        #[arg(
            short,
            long,
            required_unless_present = "request",
            conflicts_with = "request"
        )]
        output: Option<PathBuf>,

        /// Octal permission bits for the output file (e.g. 0644).
        /// Defaults to the descriptor's mode.
        #[arg(long, value_parser = parse_mode, conflicts_with = "request")]
        mode: Option<u32>,

        /// Files to store after the descriptor, in the given order.
        #[arg(required_unless_present = "request", conflicts_with = "request")]
        files: Vec<PathBuf>,

        /// Read the whole request from a JSON file instead of the flags above.
        #[arg(long, value_name = "JSON")]
        request: Option<PathBuf>,
    },
}

impl Commands {
    /// Turns a `create` invocation into a library request. Empty fields are left
    /// for [`ArchiveRequest::validate`] to reject.
    pub fn into_request(self) -> Result<ArchiveRequest> {
        match self {
            Commands::Create { request: Some(path), .. } => ArchiveRequest::from_json_file(&path),
            Commands::Create { ovf, output, mode, files, request: None } => Ok(ArchiveRequest {
                descriptor_path: ovf.unwrap_or_default(),
                member_paths: files,
                output_path: output.unwrap_or_default(),
                output_permissions: mode,
            }),
        }
    }
}

/// Parses octal permission bits: `644`, `0644` and `0o644` are all accepted.
pub fn parse_mode(s: &str) -> std::result::Result<u32, String> {
    let digits = s.strip_prefix("0o").unwrap_or(s);
    let mode = u32::from_str_radix(digits, 8).map_err(|_| format!("'{s}' is not an octal mode"))?;
    if mode > crate::fsx::MODE_MASK {
        return Err(format!("mode {s} exceeds 7777"));
    }
    Ok(mode)
}

/// Parses command-line arguments using `clap`.
///
/// Parse failures (including `--help` and `--version`) come back as a
/// `clap::Error` inside the box so the caller can let clap render them.
pub fn run() -> std::result::Result<Args, Box<dyn std::error::Error>> {
    Ok(Args::try_parse()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mode() {
        assert_eq!(parse_mode("644"), Ok(0o644));
        assert_eq!(parse_mode("0644"), Ok(0o644));
        assert_eq!(parse_mode("0o600"), Ok(0o600));
        assert_eq!(parse_mode("4755"), Ok(0o4755));
        assert!(parse_mode("0o8").is_err());
        assert!(parse_mode("rw-r--r--").is_err());
        assert!(parse_mode("17777").is_err());
    }

    #[test]
    fn test_create_flags_map_to_request() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let args = Args::try_parse_from([
            "ovaify",
            "create",
            "--ovf",
            "vm.ovf",
            "-o",
            "vm.ova",
            "--mode",
            "0640",
            "disk1.vmdk",
            "disk2.vmdk",
        ])?;
        assert_eq!(args.verbose, 0);
        let req = args.command.into_request()?;
        assert_eq!(
            req,
            ArchiveRequest::new("vm.ovf", "vm.ova")
                .members(["disk1.vmdk", "disk2.vmdk"])
                .output_permissions(0o640)
        );
        Ok(())
    }

    #[test]
    fn test_create_requires_files_without_request() {
        let res = Args::try_parse_from(["ovaify", "create", "--ovf", "vm.ovf", "-o", "vm.ova"]);
        assert!(res.is_err());
    }

    #[test]
    fn test_request_conflicts_with_flags() {
        let res =
            Args::try_parse_from(["ovaify", "create", "--request", "r.json", "--ovf", "vm.ovf"]);
        assert!(res.is_err());
        assert!(Args::try_parse_from(["ovaify", "-vv", "create", "--request", "r.json"]).is_ok());
    }
}
