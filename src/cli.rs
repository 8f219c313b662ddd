use std::path::PathBuf;

use clap::Parser;

use crate::models::Ecosystem;

#[derive(Parser, Debug)]
#[command(
    name = "license-tree",
    about = "Resolve transitive npm and PyPI dependencies and flag copyleft licenses",
    version
)]
pub struct Cli {
    /// Project path to scan
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Config file [default: ./.license-tree/config.toml, fallback ~/.config/license-tree/config.toml]
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Report format
    #[arg(long, default_value = "terminal", value_name = "FORMAT")]
    pub report: ReportFormat,

    /// Output file for json/html reports [html default: dependency-license-report.html, json default: stdout]
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Also resolve devDependencies from package.json
    #[arg(long)]
    pub dev: bool,

    /// Exclude an ecosystem from scanning (repeatable)
    #[arg(long = "exclude-lang", value_name = "LANG")]
    pub exclude_lang: Vec<EcosystemArg>,

    /// Exit with status 1 if any copyleft dependency is found
    #[arg(long)]
    pub fail_on_copyleft: bool,

    /// Show all dependencies (not just copyleft/unknown)
    #[arg(short, long)]
    pub verbose: bool,

    /// Only print summary line
    #[arg(short, long)]
    pub quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ReportFormat {
    Terminal,
    Json,
    Html,
}

#[derive(Debug, Clone, clap::ValueEnum)]
pub enum EcosystemArg {
    Node,
    Python,
}

impl From<&EcosystemArg> for Ecosystem {
    fn from(arg: &EcosystemArg) -> Self {
        match arg {
            EcosystemArg::Node => Ecosystem::Node,
            EcosystemArg::Python => Ecosystem::Python,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["license-tree"]).unwrap();
        assert_eq!(cli.path, PathBuf::from("."));
        assert_eq!(cli.report, ReportFormat::Terminal);
        assert!(cli.output.is_none());
        assert!(!cli.fail_on_copyleft);
    }

    #[test]
    fn test_flags() {
        let cli = Cli::try_parse_from([
            "license-tree",
            "proj",
            "--report",
            "html",
            "-o",
            "out.html",
            "--exclude-lang",
            "python",
            "--dev",
            "--fail-on-copyleft",
        ])
        .unwrap();
        assert_eq!(cli.report, ReportFormat::Html);
        assert_eq!(cli.output, Some(PathBuf::from("out.html")));
        let excluded: Vec<Ecosystem> = cli.exclude_lang.iter().map(Into::into).collect();
        assert_eq!(excluded, vec![Ecosystem::Python]);
        assert!(cli.dev);
        assert!(cli.fail_on_copyleft);
    }

    #[test]
    fn test_rejects_unknown_ecosystem() {
        assert!(Cli::try_parse_from(["license-tree", "--exclude-lang", "cobol"]).is_err());
    }
}
