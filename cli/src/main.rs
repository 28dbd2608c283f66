mod test_runner;
mod workspace;

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use codespan_reporting::diagnostic::{Diagnostic, Label};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};

use blockdef::{ArgKind, ToolboxEntry};
use codegen::loader::{LoadError, Loader};
use codegen::{BlockInstance, Extension};

const SUBCOMMANDS: &[&str] = &["generate", "list", "describe", "test", "help"];

#[derive(Parser)]
#[command(name = "blockgen", version, about = "Block-to-code generator for visual-programming extensions")]
struct Cli {
    /// Disable colored error output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate source code from a workspace file
    Generate(GenerateArgs),

    /// List the blocks of an extension in toolbox order
    List(ExtensionArgs),

    /// Show the definition of one block
    Describe(DescribeArgs),

    /// Run .case.toml test files
    Test(TestArgs),
}

#[derive(clap::Args)]
struct ExtensionArgs {
    /// TOML extension definition (defaults to the built-in MPU6050 blocks)
    #[arg(short = 'x', long)]
    extension: Option<PathBuf>,
}

#[derive(clap::Args)]
struct GenerateArgs {
    /// Workspace file listing the blocks to generate, in order
    file: String,

    #[command(flatten)]
    ext: ExtensionArgs,

    /// Write generated code here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Validate only, don't print the generated code
    #[arg(long)]
    check: bool,
}

#[derive(clap::Args)]
struct DescribeArgs {
    /// Block id
    id: String,

    #[command(flatten)]
    ext: ExtensionArgs,
}

#[derive(clap::Args)]
struct TestArgs {
    /// Path to a .case.toml file or directory containing them
    path: String,

    /// Run only cases in these categories (subfolder names). Repeatable.
    #[arg(short, long)]
    category: Vec<String>,

    /// List available categories and exit
    #[arg(long)]
    list_categories: bool,
}

fn main() {
    init_tracing();

    // `blockgen ws.toml` is shorthand for `blockgen generate ws.toml`.
    let mut args: Vec<String> = std::env::args().collect();
    if let Some(pos) = args.iter().skip(1).position(|a| !a.starts_with('-')) {
        let pos = pos + 1;
        if !SUBCOMMANDS.contains(&args[pos].as_str()) {
            args.insert(pos, "generate".to_string());
        }
    }

    let cli = Cli::parse_from(&args);
    let color_choice = if cli.no_color {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    };

    match cli.command {
        Command::Generate(gen_args) => do_generate(gen_args, color_choice),
        Command::List(ext_args) => {
            let mut files = SimpleFiles::new();
            let extension = load_extension(ext_args.extension.as_deref(), &mut files, color_choice);
            print_toolbox(&extension);
        }
        Command::Describe(describe_args) => {
            let mut files = SimpleFiles::new();
            let extension =
                load_extension(describe_args.ext.extension.as_deref(), &mut files, color_choice);
            if let Err(e) = describe(&extension, &describe_args.id) {
                eprintln!("error: {}", e);
                process::exit(1);
            }
        }
        Command::Test(test_args) => {
            let path = Path::new(&test_args.path);
            if test_args.list_categories {
                test_runner::list_categories(path);
                return;
            }
            let exit_code = test_runner::run_tests(path, cli.no_color, &test_args.category);
            process::exit(exit_code);
        }
    }
}

/// Install a stderr subscriber, only when `RUST_LOG` is set.
fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_level(true)
                    .with_writer(std::io::stderr),
            )
            .with(EnvFilter::from_default_env())
            .init();
    }
}

/// Load the extension named on the command line, or the built-in one.
/// Exits the process after reporting any error.
fn load_extension(
    path: Option<&Path>,
    files: &mut SimpleFiles<String, String>,
    color_choice: ColorChoice,
) -> Extension {
    let Some(path) = path else {
        return match codegen::mpu6050::extension() {
            Ok(ext) => ext,
            Err(e) => {
                eprintln!("error: built-in extension is invalid: {}", e);
                process::exit(1);
            }
        };
    };

    let source = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: cannot read '{}': {}", path.display(), e);
            process::exit(1);
        }
    };
    let file_id = files.add(path.display().to_string(), source.clone());

    match Loader::new(source, file_id).load() {
        Ok(ext) => ext,
        Err(errors) => {
            emit_load_errors(files, &errors, color_choice);
            process::exit(1);
        }
    }
}

fn emit_load_errors(
    files: &SimpleFiles<String, String>,
    errors: &[LoadError],
    color_choice: ColorChoice,
) {
    let diagnostics: Vec<Diagnostic<usize>> = errors.iter().map(|e| e.to_diagnostic()).collect();
    emit(files, &diagnostics, color_choice);
}

fn emit(files: &SimpleFiles<String, String>, diagnostics: &[Diagnostic<usize>], color_choice: ColorChoice) {
    let writer = StandardStream::stderr(color_choice);
    let config = term::Config::default();
    for diagnostic in diagnostics {
        let _ = term::emit_to_write_style(&mut writer.lock(), &config, files, diagnostic);
    }
}

fn do_generate(args: GenerateArgs, color_choice: ColorChoice) {
    let mut files = SimpleFiles::new();
    let extension = load_extension(args.ext.extension.as_deref(), &mut files, color_choice);

    let source = match std::fs::read_to_string(&args.file) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: cannot read '{}': {}", args.file, e);
            process::exit(1);
        }
    };
    let file_id = files.add(args.file.clone(), source.clone());

    let workspace = match workspace::parse_workspace(&source) {
        Ok(ws) => ws,
        Err(e) => {
            let mut diagnostic = Diagnostic::error().with_message(e.message());
            if let Some(span) = e.span() {
                diagnostic = diagnostic.with_labels(vec![Label::primary(file_id, span)]);
            }
            emit(&files, &[diagnostic], color_choice);
            process::exit(1);
        }
    };

    let mut instances: Vec<BlockInstance> = Vec::with_capacity(workspace.blocks.len());
    let mut bad_entries = Vec::new();
    for entry in &workspace.blocks {
        match entry.get_ref().to_instance() {
            Ok(instance) => instances.push(instance),
            Err(message) => bad_entries.push(
                Diagnostic::error()
                    .with_message(message)
                    .with_labels(vec![Label::primary(file_id, entry.span())]),
            ),
        }
    }
    if !bad_entries.is_empty() {
        emit(&files, &bad_entries, color_choice);
        process::exit(1);
    }

    tracing::debug!(file = %args.file, blocks = instances.len(), "generating workspace");
    let program = match codegen::generate_program(&extension, &instances) {
        Ok(p) => p,
        Err(failure) => {
            let span = workspace.blocks[failure.index].span();
            let diagnostic = Diagnostic::error()
                .with_message(failure.error.to_string())
                .with_labels(vec![
                    Label::primary(file_id, span).with_message("while generating this block"),
                ]);
            emit(&files, &[diagnostic], color_choice);
            process::exit(1);
        }
    };

    let warnings: Vec<Diagnostic<usize>> = program
        .warnings
        .iter()
        .map(|w| Diagnostic::warning().with_message(w.to_string()))
        .collect();
    emit(&files, &warnings, color_choice);

    if args.check {
        eprintln!("ok: {} generated successfully", args.file);
        return;
    }

    match &args.output {
        Some(path) => {
            if let Err(e) = std::fs::write(path, &program.source) {
                eprintln!("error: cannot write '{}': {}", path.display(), e);
                process::exit(1);
            }
        }
        None => print!("{}", program.source),
    }
}

fn print_toolbox(extension: &Extension) {
    let manifest = extension.manifest();
    println!(
        "{} {} ({}) by {}",
        manifest.name, manifest.version, manifest.category, manifest.author
    );
    if !manifest.description.is_empty() {
        println!("{}", manifest.description);
    }
    for entry in &manifest.toolbox {
        match entry {
            ToolboxEntry::Label(text) => {
                println!();
                println!("-- {} --", text);
            }
            ToolboxEntry::Block(id) => {
                if let Some(block) = extension.schema().get(id) {
                    println!("  {:<20} {}", block.id, block.message);
                }
            }
        }
    }
}

fn describe(extension: &Extension, id: &str) -> Result<(), codegen::CodegenError> {
    let block = extension.lookup(id)?;
    println!("{} ({})", block.id, block.shape.as_str());
    println!("  message: {}", block.message);
    if !block.style.colour.is_empty() {
        println!("  colour:  {}", block.style.colour);
    }
    if !block.style.tooltip.is_empty() {
        println!("  tooltip: {}", block.style.tooltip);
    }
    for arg in &block.args {
        match &arg.kind {
            ArgKind::Dropdown(options) => {
                let values: Vec<&str> = options.iter().map(|o| o.value.as_str()).collect();
                println!("  arg {}: dropdown [{}]", arg.name, values.join(", "));
            }
            ArgKind::Text { default } => println!("  arg {}: text (default {:?})", arg.name, default),
            ArgKind::Number { default } => println!("  arg {}: number (default {})", arg.name, default),
        }
    }

    let defaults: Vec<String> = block.args.iter().map(|a| a.default_value()).collect();
    let labels: Vec<&str> = block
        .args
        .iter()
        .zip(&defaults)
        .map(|(a, v)| a.label_for(v))
        .collect();
    println!("  renders: {}", block.render_message(&labels));

    let instance = block
        .args
        .iter()
        .zip(defaults)
        .fold(BlockInstance::new(id), |inst, (a, v)| inst.field(a.name.clone(), v));
    let mut ctx = codegen::GenerationContext::new();
    let fragment = extension.generate(id, &instance.fields, &mut ctx)?;
    for line in ctx.definitions.lines() {
        println!("  needs:   {}", line);
    }
    for line in fragment.code().lines() {
        println!("  emits:   {}", line);
    }
    Ok(())
}
