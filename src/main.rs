use clap::{Parser, Subcommand};
use pngcrypt::cli::{
    decrypt_file, encrypt_file, generate_key_files, show_info, CryptOptions, KeygenOptions,
};
use pngcrypt::config::{
    CipherMode, CodecFailurePolicy, CodecPolicy, ExponentPolicy, DEFAULT_COMPRESSION_LEVEL,
};
use pngcrypt::TransformReport;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Version info from build.rs
const VERSION: &str = env!("PNGCRYPT_VERSION");
const BUILD: &str = env!("PNGCRYPT_BUILD");
const PROFILE: &str = env!("PNGCRYPT_PROFILE");
const GIT_HASH: &str = env!("PNGCRYPT_GIT_HASH");

fn get_version() -> &'static str {
    use std::sync::OnceLock;
    static VERSION_STRING: OnceLock<String> = OnceLock::new();
    VERSION_STRING.get_or_init(|| format!("{} {} build {} ({})", PROFILE, VERSION, BUILD, GIT_HASH))
}

#[derive(Parser)]
#[command(name = "pngcrypt")]
#[command(author, about = "RSA encryption of PNG image data", long_about = None)]
struct Cli {
    /// Print version
    #[arg(short = 'V', long)]
    version: bool,

    /// Log progress to stderr (overridden by PNGCRYPT_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Args)]
struct CryptArgs {
    /// Key file (.key, or .pub where the public half is enough)
    #[arg(long, required = true)]
    key: PathBuf,

    /// Cipher mode (ecb or ctr)
    #[arg(long, default_value = "ecb", value_parser = parse_mode)]
    mode: CipherMode,

    /// Payload codec for image data (zlib or raw)
    #[arg(long, default_value = "zlib", value_parser = parse_codec)]
    codec: CodecPolicy,

    /// zlib compression level for rewritten chunks (0-9)
    #[arg(long, default_value_t = DEFAULT_COMPRESSION_LEVEL)]
    level: u32,

    /// What to do when image data fails to decode (abort or skip)
    #[arg(long, default_value = "abort", value_parser = parse_failure)]
    on_codec_error: CodecFailurePolicy,

    /// Input PNG file
    input: PathBuf,

    /// Output PNG file
    output: Option<PathBuf>,
}

impl CryptArgs {
    fn split(self, suffix: &str) -> (PathBuf, PathBuf, CryptOptions) {
        let output = self
            .output
            .unwrap_or_else(|| default_output_path(&self.input, suffix));
        let options = CryptOptions {
            key: self.key,
            mode: self.mode,
            codec: self.codec,
            level: self.level,
            on_codec_error: self.on_codec_error,
        };
        (self.input, output, options)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Generate an RSA key pair (<stem>.key and <stem>.pub)
    #[command(alias = "k")]
    Keygen {
        /// Modulus size in bits
        #[arg(long, default_value = "1024")]
        bits: usize,

        /// Public exponent (fixed 65537 or random)
        #[arg(long, default_value = "fixed", value_parser = parse_exponent)]
        exponent: ExponentPolicy,

        /// Output path stem
        output: PathBuf,
    },

    /// Encrypt the image data of a PNG file
    #[command(alias = "e")]
    Encrypt(CryptArgs),

    /// Decrypt the image data of a PNG file
    #[command(alias = "d")]
    Decrypt(CryptArgs),

    /// Show the chunk structure of a PNG file
    #[command(alias = "i")]
    Info {
        /// PNG file to inspect
        file: PathBuf,
    },
}

fn parse_mode(s: &str) -> Result<CipherMode, String> {
    s.parse().map_err(|e| format!("{}", e))
}

fn parse_codec(s: &str) -> Result<CodecPolicy, String> {
    s.parse().map_err(|e| format!("{}", e))
}

fn parse_failure(s: &str) -> Result<CodecFailurePolicy, String> {
    s.parse().map_err(|e| format!("{}", e))
}

fn parse_exponent(s: &str) -> Result<ExponentPolicy, String> {
    s.parse().map_err(|e| format!("{}", e))
}

/// `image.png` becomes `image.png.enc.png`
fn default_output_path(input: &Path, suffix: &str) -> PathBuf {
    let mut os = input.as_os_str().to_os_string();
    os.push(suffix);
    PathBuf::from(os)
}

fn init_logging(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_env("PNGCRYPT_LOG").unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn print_report(report: &TransformReport, output: &Path) {
    println!(
        "Image data {}ed: {} of {} chunks ({} mode) -> {}",
        report.direction,
        report.transformed,
        report.records,
        report.mode,
        output.display()
    );
    if report.skipped > 0 {
        println!("Copied {} undecodable chunks through unchanged", report.skipped);
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.version {
        println!("pngcrypt {}", get_version());
        return ExitCode::SUCCESS;
    }

    init_logging(cli.verbose);

    let command = match cli.command {
        Some(cmd) => cmd,
        None => {
            use clap::CommandFactory;
            let _ = Cli::command().print_help();
            println!();
            return ExitCode::SUCCESS;
        }
    };

    let result = match command {
        Commands::Keygen {
            bits,
            exponent,
            output,
        } => {
            let options = KeygenOptions { bits, exponent };
            generate_key_files(&output, &options).map(|summary| {
                println!("Generated {}-bit key {}", summary.bits, summary.fingerprint);
                println!("Private key: {}", summary.private_path.display());
                println!("Public key:  {}", summary.public_path.display());
            })
        }

        Commands::Encrypt(args) => {
            let (input, output, options) = args.split(".enc.png");
            encrypt_file(&input, &output, &options).map(|report| print_report(&report, &output))
        }

        Commands::Decrypt(args) => {
            let (input, output, options) = args.split(".dec.png");
            decrypt_file(&input, &output, &options).map(|report| print_report(&report, &output))
        }

        Commands::Info { file } => show_info(&file).map(|info| print!("{}", info)),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
