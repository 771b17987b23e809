//! CLI for AgriVision - edit farm photos with Gemini.

use agrivision::{
    Config, ConfigError, EditClient, EditStatus, EncodeError, EncodedImage, Session,
    SessionError, EXAMPLE_PROMPTS,
};
use clap::{Args, Parser, Subcommand};
use display_error_chain::DisplayErrorChain;
use snafu::{OptionExt, ResultExt, Snafu};
use std::{path::PathBuf, process::ExitCode};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "agrivision")]
#[command(about = "Visualize changes to a farm photo with a natural-language instruction")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Edit a photo and save the result
    Edit(EditArgs),

    /// List the example instructions
    Prompts,
}

#[derive(Args)]
struct EditArgs {
    /// Photo to edit
    #[arg(short, long)]
    input: PathBuf,

    /// How the image should be changed
    #[arg(short, long, conflicts_with = "example")]
    prompt: Option<String>,

    /// Use an example instruction by its number (see `agrivision prompts`)
    #[arg(short, long)]
    example: Option<usize>,

    /// Directory the edited image is saved into
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Print the outcome as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Snafu)]
enum CliError {
    #[snafu(display("invalid configuration"))]
    Configuration { source: ConfigError },

    #[snafu(display("failed to load the photo"))]
    LoadImage { source: EncodeError },

    #[snafu(display("there is no example prompt #{number}; run `agrivision prompts` to list them"))]
    UnknownExample { number: usize },

    #[snafu(display("an instruction is required (use --prompt or --example)"))]
    MissingInstruction,

    #[snafu(display("{message}"))]
    EditFailed { message: String },

    #[snafu(display("failed to save the edited image"))]
    Save { source: SessionError },

    #[snafu(display("failed to print the outcome"))]
    Output { source: serde_json::Error },
}

async fn edit(config: &Config, args: EditArgs) -> Result<(), CliError> {
    let image = EncodedImage::from_path(&args.input)
        .await
        .context(LoadImageSnafu)?;

    let mut session = Session::new();
    session.load_image(image);
    match (args.prompt, args.example) {
        (Some(prompt), _) => session.set_instruction(prompt),
        (None, Some(number)) => {
            session
                .use_example_prompt(number.wrapping_sub(1))
                .context(UnknownExampleSnafu { number })?;
        }
        (None, None) => {}
    }
    if !session.can_submit() {
        return MissingInstructionSnafu.fail();
    }

    if !args.json {
        println!("Processing with Gemini...");
    }
    let client = EditClient::from_config(config);
    if session.submit(&client).await != EditStatus::Succeeded {
        let message = session
            .error_message()
            .unwrap_or(agrivision::GENERIC_FAILURE_MESSAGE)
            .to_string();
        return EditFailedSnafu { message }.fail();
    }

    let path = session.download(&args.output_dir).await.context(SaveSnafu)?;
    if args.json {
        let media_type = session.result().map(|r| r.media_type());
        let outcome = serde_json::json!({
            "instruction": session.instruction().trim(),
            "mediaType": media_type,
            "path": path.display().to_string(),
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&outcome).context(OutputSnafu)?
        );
    } else {
        println!("Saved edited image to {}", path.display());
    }
    Ok(())
}

fn prompts() {
    for (i, prompt) in EXAMPLE_PROMPTS.iter().enumerate() {
        println!("{:>2}. {prompt}", i + 1);
    }
}

async fn do_main(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Edit(args) => {
            let config = Config::from_env().context(ConfigurationSnafu)?;
            edit(&config, args).await
        }
        Commands::Prompts => {
            prompts();
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(err) = do_main(cli).await {
        let formatted = DisplayErrorChain::new(err).to_string();
        eprintln!("{formatted}");
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
