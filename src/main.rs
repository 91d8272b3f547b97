use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use frank_tools::api::{self, AppState};
use frank_tools::audio::{parse_chapter_file, M4bSplitter};
use frank_tools::config::Config;
use frank_tools::download::DriveDownloader;
use frank_tools::translate::{GoogleTranslator, TranslateOptions, Translator};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "frank-tools")]
#[command(version, about = "Frank tools CLI")]
#[command(long_about = "Translate text, download Google Drive files, and split M4B audiobooks into chapters.")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Download a file from Google Drive
    DriveDownload {
        /// Google Drive share link or file ID
        #[arg(short, long)]
        link: String,

        /// Directory to save the download
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },

    /// Translate text
    Translate {
        /// Text to translate
        #[arg(long)]
        text: String,

        /// Source language
        #[arg(long, default_value = "auto")]
        sl: String,

        /// Target language
        #[arg(long, default_value = "en")]
        tl: String,
    },

    /// Split an M4B using a chapter manifest
    M4bSplit {
        /// Input .m4b file
        #[arg(long)]
        input: PathBuf,

        /// Chapter manifest file (<start>,<end>,<title> per line)
        #[arg(long)]
        chapters: PathBuf,

        /// Directory for chapter files
        #[arg(long, default_value = "output")]
        output: PathBuf,
    },

    /// Serve the HTTP API (/health, /translate)
    Serve {
        /// Address to bind, e.g. 127.0.0.1:8000 (defaults to the configured address)
        #[arg(long)]
        addr: Option<String>,
    },
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };

    FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();
}

async fn translate_text(translator: &dyn Translator, text: &str, sl: &str, tl: &str) -> Result<String> {
    let options = TranslateOptions::new(sl, tl);
    let result = translator
        .translate(text, &options)
        .await
        .context("Translation failed")?;
    debug!(
        "Source language: {}",
        result.src_lang.as_deref().unwrap_or("unknown")
    );
    Ok(result.translation)
}

async fn split_chapters(config: &Config, input: &Path, chapters: &Path, output: &Path) -> Result<Vec<PathBuf>> {
    let manifest = parse_chapter_file(chapters)
        .with_context(|| format!("Failed to read chapter manifest {}", chapters.display()))?;
    let splitter = M4bSplitter::from_manifest(input, &manifest, output)
        .context("Failed to prepare output directory")?
        .with_ffmpeg_path(config.ffmpeg_path.clone());
    let outputs = splitter.split().await.context("Chapter split failed")?;
    Ok(outputs)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    // Load and validate configuration
    let config = Config::load().context("Failed to load configuration")?;
    config.validate().context("Configuration validation failed")?;

    match cli.command {
        Command::DriveDownload { link, output } => {
            let downloader = DriveDownloader::from_config(&config)?;
            let destination = downloader
                .download_from_link(&link, &output)
                .await
                .context("Drive download failed")?;
            println!("Downloaded to: {}", destination.display());
        }
        Command::Translate { text, sl, tl } => {
            let translator = GoogleTranslator::from_config(&config);
            println!("{}", translate_text(&translator, &text, &sl, &tl).await?);
        }
        Command::M4bSplit {
            input,
            chapters,
            output,
        } => {
            for path in split_chapters(&config, &input, &chapters, &output).await? {
                println!("{}", path.display());
            }
        }
        Command::Serve { addr } => {
            let addr: SocketAddr = match addr {
                Some(addr) => addr
                    .parse()
                    .with_context(|| format!("Invalid address: {addr}"))?,
                None => config.socket_addr()?,
            };
            let state = AppState::new(Arc::new(GoogleTranslator::from_config(&config)));
            api::serve(addr, state).await.context("HTTP server failed")?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use frank_tools::translate::TranslationResult;

    struct FakeTranslator;

    #[async_trait]
    impl Translator for FakeTranslator {
        async fn translate(
            &self,
            text: &str,
            options: &TranslateOptions,
        ) -> frank_tools::Result<TranslationResult> {
            Ok(TranslationResult {
                translation: format!("{text}-{}", options.target_lang),
                original: text.to_string(),
                src_lang: Some(options.source_lang.clone()),
                alternatives: Vec::new(),
                raw: serde_json::Value::Null,
            })
        }

        fn name(&self) -> &'static str {
            "fake"
        }
    }

    #[test]
    fn test_parse_drive_download() {
        let cli = Cli::try_parse_from(["frank-tools", "drive-download", "--link", "abc123", "-o", "/tmp/x"]).unwrap();
        match cli.command {
            Command::DriveDownload { link, output } => {
                assert_eq!(link, "abc123");
                assert_eq!(output, PathBuf::from("/tmp/x"));
            }
            _ => panic!("Expected drive-download"),
        }
    }

    #[test]
    fn test_parse_translate_defaults() {
        let cli = Cli::try_parse_from(["frank-tools", "translate", "--text", "hola"]).unwrap();
        match cli.command {
            Command::Translate { text, sl, tl } => {
                assert_eq!(text, "hola");
                assert_eq!(sl, "auto");
                assert_eq!(tl, "en");
            }
            _ => panic!("Expected translate"),
        }
    }

    #[test]
    fn test_parse_m4b_split() {
        let cli = Cli::try_parse_from([
            "frank-tools",
            "-v",
            "m4b-split",
            "--input",
            "file.m4b",
            "--chapters",
            "chapters.txt",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Command::M4bSplit { input, chapters, output } => {
                assert_eq!(input, PathBuf::from("file.m4b"));
                assert_eq!(chapters, PathBuf::from("chapters.txt"));
                assert_eq!(output, PathBuf::from("output"));
            }
            _ => panic!("Expected m4b-split"),
        }
    }

    #[test]
    fn test_missing_required_argument() {
        assert!(Cli::try_parse_from(["frank-tools", "drive-download"]).is_err());
        assert!(Cli::try_parse_from(["frank-tools"]).is_err());
    }

    #[tokio::test]
    async fn test_translate_text_dispatch() {
        let translation = translate_text(&FakeTranslator, "hola", "es", "en").await.unwrap();
        assert_eq!(translation, "hola-en");
    }

    #[tokio::test]
    async fn test_split_chapters_missing_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let result = split_chapters(
            &Config::default(),
            Path::new("file.m4b"),
            &dir.path().join("missing.txt"),
            dir.path(),
        )
        .await;
        assert!(result.is_err());
    }
}
