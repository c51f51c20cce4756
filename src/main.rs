use std::io::{self, BufReader, BufWriter};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use log::info;

use skewfix::{Calibration, SkewCorrector, correct_file, correct_stream, output_path};

/// Fix XY skew in G-code for cantilever printers
#[derive(Parser, Debug, PartialEq)]
#[command(author, version, about)]
struct Args {
    /// G-code file to correct, or - to read stdin and write stdout
    input: String,

    /// Output file (default: <name>-fix-skew.<ext> next to the input)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Measured Y offset of the far X corner, in mm
    #[arg(long, allow_negative_numbers = true)]
    offset: Option<f64>,

    /// Side length of the measured square, in mm
    #[arg(long)]
    baseline: Option<f64>,

    /// Calibration JSON file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Store the effective calibration in the config file
    #[arg(long, default_value_t = false)]
    save_config: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = Args::parse();

    let config_path = args.config.clone().unwrap_or_else(Calibration::json_path);
    let base = match &args.config {
        Some(path) => Calibration::load_from(path)
            .with_context(|| format!("loading calibration from {}", path.display()))?,
        None => Calibration::load(),
    };
    let cal = base.with_overrides(args.offset, args.baseline);
    cal.validate()?;
    info!("Calibration: offset {} mm over {} mm", cal.offset, cal.baseline);

    if args.save_config {
        cal.save_to(&config_path)
            .with_context(|| format!("saving calibration to {}", config_path.display()))?;
        info!("Saved calibration to {}", config_path.display());
    }

    if args.input == "-" {
        let mut corrector = SkewCorrector::new(&cal)?;
        let reader = BufReader::new(io::stdin().lock());
        let writer = BufWriter::new(io::stdout().lock());
        let report = correct_stream(&mut corrector, reader, writer)?;
        eprintln!("Modified {} lines", report.modified);
    } else {
        let input = PathBuf::from(&args.input);
        let output = args.output.unwrap_or_else(|| output_path(&input));
        let report = correct_file(&cal, &input, &output)
            .with_context(|| format!("correcting {}", input.display()))?;
        println!("Modified {} lines", report.modified);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Result<Args, clap::Error> {
        Args::try_parse_from(std::iter::once("skewfix").chain(list.iter().copied()))
    }

    #[test]
    fn test_parse_args() {
        let parsed =
            args(&["print.gcode", "--offset", "-0.8", "--baseline", "150", "-o", "out.gcode"]).unwrap();
        assert_eq!(
            parsed,
            Args {
                input: "print.gcode".into(),
                output: Some("out.gcode".into()),
                offset: Some(-0.8),
                baseline: Some(150.0),
                config: None,
                save_config: false,
            }
        );
    }

    #[test]
    fn test_parse_args_stdin_and_flags() {
        let parsed = args(&["-c", "cal.json", "--save-config", "-"]).unwrap();
        assert_eq!(parsed.input, "-");
        assert_eq!(parsed.config, Some(PathBuf::from("cal.json")));
        assert!(parsed.save_config);
    }

    #[test]
    fn test_parse_args_help() {
        let err = args(&["--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_parse_args_errors() {
        assert!(args(&[]).is_err());
        assert!(args(&["a.gcode", "b.gcode"]).is_err());
        assert!(args(&["a.gcode", "--offset"]).is_err());
        assert!(args(&["a.gcode", "--baseline", "wide"]).is_err());
        assert!(args(&["a.gcode", "--verbose"]).is_err());
    }

    #[test]
    fn test_args_definition() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }
}
