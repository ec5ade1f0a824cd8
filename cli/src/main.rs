mod input_files;
mod output_files;

use std::path::{Path, PathBuf};
use std::process::exit;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dotenvy::dotenv;

use scripture_backend::api::generate_output_files;
use scripture_backend::dataset::DatasetOutput;
use scripture_backend::generate_output_files_from_inputs;
use scripture_backend::input::{parse_input_file, InputFile, InputFileType, ParsedInput};
use scripture_backend::logger::{Log, Logger};
use scripture_backend::output::{OutputFile, OutputMerger};
use scripture_backend::settings::GenerationSettings;

use crate::input_files::{find_input_directories, load_input_directory, read_metadata};
use crate::output_files::{OutputWriter, UreqFetcher};

#[derive(Parser, Debug)]
#[command(author, version, about = "Scripture API generator", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate the static JSON API from a directory of input files
    #[command(arg_required_else_help = true)]
    Generate {
        /// Directory to search for translations and commentaries.
        /// Each directory with a metadata.json file is loaded as one batch.
        #[arg(long, value_name = "DIRECTORY_PATH", env = "API_INPUT_DIR")]
        input: PathBuf,

        /// Directory to write the API files to
        #[arg(long, value_name = "DIRECTORY_PATH", env = "API_OUTPUT_DIR")]
        output: PathBuf,

        /// JSON settings file. API_* environment variables are used when not given.
        #[arg(long, value_name = "FILE_PATH")]
        settings: Option<PathBuf>,

        /// Use book common names instead of ids in chapter paths
        #[arg(long, default_value_t = false)]
        use_common_name: bool,

        /// Download chapter audio and link to the local copies
        #[arg(long, default_value_t = false)]
        download_audio: bool,

        /// Prefix for every output path (e.g. "/v1")
        #[arg(long, value_name = "PREFIX")]
        path_prefix: Option<String>,

        /// Write complete.json for each translation
        #[arg(long, default_value_t = false)]
        complete_translations: bool,

        /// Pretty-print the JSON files
        #[arg(long, default_value_t = false)]
        pretty: bool,

        /// Merge the listing files with the ones already in the output directory
        #[arg(long, default_value_t = false)]
        merge_existing: bool,

        /// Serialized dataset output with extra datasets, such as cross references
        #[arg(long, value_name = "FILE_PATH")]
        datasets: Option<PathBuf>,
    },

    /// Parse a single input file and print its parse tree as JSON
    #[command(arg_required_else_help = true)]
    Parse {
        /// The file to parse
        #[arg(value_name = "FILE_PATH")]
        path: PathBuf,

        /// Metadata file to use. Defaults to metadata.json next to the input file.
        #[arg(long, value_name = "FILE_PATH")]
        metadata: Option<PathBuf>,
    },
}

struct GenerateOptions {
    input: PathBuf,
    output: PathBuf,
    settings: GenerationSettings,
    merge_existing: bool,
    datasets: Option<PathBuf>,
}

fn generate(options: &GenerateOptions, log: &dyn Log) -> Result<()> {
    let dirs = find_input_directories(&options.input)?;
    if dirs.is_empty() {
        log.warn(&format!("No metadata.json files found under {}", options.input.display()));
    }

    let fetcher = UreqFetcher;
    let writer = OutputWriter::new(&options.output, &fetcher, options.settings.pretty_json)
        .merge_existing(options.merge_existing);

    // Listing files are shared by every batch, they are written once at the end.
    let mut listings = OutputMerger::new();
    let mut written = 0;

    for dir in dirs {
        let input = load_input_directory(&dir, log)?;
        let files = generate_output_files_from_inputs(&input.files, &options.settings, log)
            .with_context(|| format!("Failed to generate output for {}", dir.display()))?;

        let (mergable, files): (Vec<OutputFile>, Vec<OutputFile>) = files.into_iter().partition(|f| f.mergable);
        written += writer.write_all(&files)?;
        listings.extend(mergable);
    }

    if let Some(path) = &options.datasets {
        let json = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
        let dataset = DatasetOutput::from_json(&json).with_context(|| format!("Failed to load {}", path.display()))?;
        log.info(&format!("Loaded {} datasets from {}", dataset.datasets.len(), path.display()));

        let files = generate_output_files(&dataset, &options.settings)?;
        let (mergable, files): (Vec<OutputFile>, Vec<OutputFile>) = files.into_iter().partition(|f| f.mergable);
        written += writer.write_all(&files)?;
        listings.extend(mergable);
    }

    written += writer.write_all(&listings.finish())?;
    log.info(&format!("Wrote {} files to {}", written, options.output.display()));

    Ok(())
}

fn parse_file(path: &Path, metadata_path: Option<&Path>, log: &dyn Log) -> Result<String> {
    let metadata = match metadata_path {
        Some(p) => {
            let json = std::fs::read_to_string(p).with_context(|| format!("Failed to read {}", p.display()))?;
            serde_json::from_str(&json).with_context(|| format!("Failed to parse {}", p.display()))?
        }
        None => read_metadata(path.parent().unwrap_or(Path::new(".")))?,
    };

    let content = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let extension = path.extension().map(|e| e.to_string_lossy().into_owned()).unwrap_or_default();
    let file_type = InputFileType::infer(&extension, &content)
        .with_context(|| format!("Unknown input file type: {}", path.display()))?;

    let file = InputFile {
        name: path.file_name().map(|n| n.to_string_lossy().into_owned()),
        file_type,
        metadata,
        content,
        sha256: None,
    };

    let json = match parse_input_file(&file, log)? {
        ParsedInput::Scripture(trees) => serde_json::to_string_pretty(&trees)?,
        ParsedInput::Commentary(tree) => serde_json::to_string_pretty(&tree)?,
    };
    Ok(json)
}

fn main() {
    // The .env file may set API_* variables, clap and the settings read them from the environment.
    if dotenv().is_err() {
        println!("Info: No .env file found or failed to load.");
    }

    if let Err(e) = Logger::init_tracing() {
        eprintln!("Failed to initialize logging: {}", e);
    }
    let log = Logger::from_env();

    let cli = Cli::parse();

    let command_result = match cli.command {
        Commands::Generate {
            input,
            output,
            settings,
            use_common_name,
            download_audio,
            path_prefix,
            complete_translations,
            pretty,
            merge_existing,
            datasets,
        } => {
            let settings = match settings {
                Some(path) => GenerationSettings::from_json_file(&path),
                None => Ok(GenerationSettings::from_env()),
            };

            settings.and_then(|mut settings| {
                // Flags only switch options on, they never override a setting back to off.
                settings.use_common_name |= use_common_name;
                settings.download_audio |= download_audio;
                settings.generate_complete_translations |= complete_translations;
                settings.pretty_json |= pretty;
                if let Some(prefix) = path_prefix {
                    settings.path_prefix = prefix.trim_end_matches('/').to_string();
                }

                let options = GenerateOptions { input, output, settings, merge_existing, datasets };
                generate(&options, &log)
            })
        }

        Commands::Parse { path, metadata } => {
            parse_file(&path, metadata.as_deref(), &log).map(|json| println!("{}", json))
        }
    };

    if let Err(e) = command_result {
        eprintln!("Error executing command: {:#}", e);
        exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scripture_backend::logger::NoopLogger;
    use std::fs;

    const METADATA: &str = r#"{
        "translation": {
            "id": "bsb",
            "name": "Berean Standard Bible",
            "englishName": "Berean Standard Bible",
            "shortName": "BSB",
            "website": "https://berean.bible",
            "licenseUrl": "https://berean.bible/terms.htm",
            "language": "eng"
        }
    }"#;

    const COMMENTARY_METADATA: &str = r#"{
        "commentary": {
            "id": "notes",
            "name": "Notes",
            "englishName": "Notes",
            "website": "https://example.com",
            "licenseUrl": "https://example.com/license",
            "language": "eng"
        }
    }"#;

    const GENESIS: &str = "<BN>GENESIS</BN>
<CN>CHAPTER 1</CN>
<PM>{{01::1}}1<T>In the beginning God created the heavens and the earth.
";

    const NOTES: &str = "Book,Chapter,Verse,Commentaries
Genesis,,,Introduction
,1,,
,,Genesis 1:1,A note
";

    const CROSS_REFERENCES: &str = r#"{
        "translations": [],
        "datasets": [{
            "id": "open-cross-ref",
            "name": "Open Cross Ref",
            "englishName": "Open Cross Ref",
            "website": "https://www.openbible.info/labs/cross-references/",
            "licenseUrl": "https://creativecommons.org/licenses/by/4.0/",
            "language": "eng",
            "books": [{"id": "GEN", "order": 1, "chapters": [{"chapter": {"number": 1, "content": [
                {"verse": 1, "references": [{"book": "JHN", "chapter": 1, "verse": 1}]}
            ]}}]}]
        }]
    }"#;

    fn write_inputs(root: &Path) {
        let bsb = root.join("bible").join("bsb");
        fs::create_dir_all(&bsb).unwrap();
        fs::write(bsb.join("metadata.json"), METADATA).unwrap();
        fs::write(bsb.join("01_GEN.txt"), GENESIS).unwrap();

        let notes = root.join("commentaries").join("notes");
        fs::create_dir_all(&notes).unwrap();
        fs::write(notes.join("metadata.json"), COMMENTARY_METADATA).unwrap();
        fs::write(notes.join("notes.csv"), NOTES).unwrap();
    }

    fn read_json(path: &Path) -> serde_json::Value {
        serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
    }

    #[test]
    fn test_generate() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        write_inputs(input.path());

        let options = GenerateOptions {
            input: input.path().to_path_buf(),
            output: output.path().to_path_buf(),
            settings: GenerationSettings::default(),
            merge_existing: false,
            datasets: None,
        };
        generate(&options, &NoopLogger).unwrap();

        let api = output.path().join("api");
        assert!(api.join("bsb/books.json").is_file());
        assert!(api.join("bsb/GEN/1.json").is_file());
        assert!(api.join("c/notes/GEN/1.json").is_file());

        let translations = read_json(&api.join("available_translations.json"));
        assert_eq!(translations["translations"].as_array().unwrap().len(), 1);
        let commentaries = read_json(&api.join("available_commentaries.json"));
        assert_eq!(commentaries["commentaries"][0]["id"], "notes");
    }

    #[test]
    fn test_generate_with_datasets() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        write_inputs(input.path());

        let datasets_path = input.path().join("datasets.json");
        fs::write(&datasets_path, CROSS_REFERENCES).unwrap();

        let options = GenerateOptions {
            input: input.path().to_path_buf(),
            output: output.path().to_path_buf(),
            settings: GenerationSettings::default(),
            merge_existing: false,
            datasets: Some(datasets_path),
        };
        generate(&options, &NoopLogger).unwrap();

        let api = output.path().join("api");
        assert!(api.join("d/open-cross-ref/books.json").is_file());
        assert!(api.join("d/open-cross-ref/GEN/1.json").is_file());

        let datasets = read_json(&api.join("available_datasets.json"));
        assert_eq!(datasets["datasets"][0]["totalNumberOfReferences"], 1);
        // the dataset batch must not wipe the listings of the input batches
        let translations = read_json(&api.join("available_translations.json"));
        assert_eq!(translations["translations"][0]["id"], "bsb");
    }

    #[test]
    fn test_parse_file() {
        let input = tempfile::tempdir().unwrap();
        write_inputs(input.path());

        let json = parse_file(&input.path().join("bible/bsb/01_GEN.txt"), None, &NoopLogger).unwrap();
        let trees: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(trees[0]["id"], "GEN");
    }
}
