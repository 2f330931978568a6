use std::error::Error;
use std::fs;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use membership_form::acroform;
use membership_form::config::{DEFAULT_CONTENT_PATH, DEFAULT_LOGO_PATH, DEFAULT_OUTPUT_PATH};
use membership_form::{generate, FormConfig, FormError};

/// Renders the fillable membership application form.
///
/// Fonts are looked up under `assets/fonts` or in the directory named by the
/// `MEMBERSHIP_FORM_FONTS_DIR` environment variable unless `--fonts` is given.
#[derive(Parser)]
#[command(author, version, about = "Fillable membership form generator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the form to a PDF file.
    Render {
        /// Content store with the statute text and the fee table.
        #[arg(long, default_value = DEFAULT_CONTENT_PATH)]
        content: PathBuf,
        /// Directory containing the OpenSans font faces.
        #[arg(long)]
        fonts: Option<PathBuf>,
        /// Logo image printed in the page header.
        #[arg(long, default_value = DEFAULT_LOGO_PATH)]
        logo: PathBuf,
        /// Where the PDF is written.
        #[arg(short, long, default_value = DEFAULT_OUTPUT_PATH)]
        output: PathBuf,
    },

    /// List the form fields of a rendered PDF with their current values.
    #[command(aliases = ["list-fields"])]
    Fields {
        /// The PDF to inspect.
        pdf: PathBuf,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Render {
            content,
            fonts,
            logo,
            output,
        } => render(
            FormConfig::new()
                .with_content_path(content)
                .with_fonts_dir(fonts)
                .with_logo_path(logo)
                .with_output_path(output),
        ),
        Commands::Fields { pdf } => list_fields(pdf),
    };

    if let Err(err) = result {
        for line in failure_report(&err) {
            eprintln!("{line}");
        }
        std::process::exit(1);
    }
}

fn render(config: FormConfig) -> Result<(), FormError> {
    let report = generate(&config)?;
    println!(
        "{}: {} page(s), {} field(s)",
        report.output.display(),
        report.pages,
        report.fields
    );
    Ok(())
}

fn list_fields(path: PathBuf) -> Result<(), FormError> {
    let bytes = fs::read(&path).map_err(|err| FormError::AssetLoad {
        path: path.clone(),
        reason: err.to_string(),
    })?;
    for (name, value) in acroform::field_values(&bytes)? {
        let options = acroform::radio_options(&bytes, &name)?;
        if options.is_empty() {
            println!("{name} = {value:?}");
        } else {
            println!("{name} = {value:?} [{}]", options.join(", "));
        }
    }
    Ok(())
}

/// The failure followed by its underlying causes, innermost last.
fn failure_report(err: &FormError) -> Vec<String> {
    let causes = std::iter::successors(err.source(), |&cause: &&(dyn std::error::Error + 'static)| {
        cause.source()
    });
    std::iter::once(format!("membership-form: {err}"))
        .chain(causes.map(|cause| format!("    because {cause}")))
        .collect()
}
