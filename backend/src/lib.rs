pub mod book_order;
pub mod reference;
pub mod error;
pub mod logger;
pub mod types;
pub mod parser;
pub mod input;
pub mod settings;
pub mod audio;
pub mod dataset;
pub mod api;
pub mod output;

use crate::api::generate_output_files;
use crate::dataset::generate_dataset;
use crate::error::DatasetError;
use crate::input::InputFile;
use crate::logger::Log;
use crate::output::{OutputError, OutputFile};
use crate::settings::GenerationSettings;

#[derive(thiserror::Error, Debug)]
pub enum GenerateError {
    #[error(transparent)]
    Dataset(#[from] DatasetError),

    #[error(transparent)]
    Output(#[from] OutputError),
}

/// Run the whole pipeline on one batch of input files.
pub fn generate_output_files_from_inputs(
    files: &[InputFile],
    settings: &GenerationSettings,
    log: &dyn Log,
) -> Result<Vec<OutputFile>, GenerateError> {
    let dataset = generate_dataset(files, settings, log)?;
    log.info(&format!(
        "Assembled {} translations and {} commentaries",
        dataset.translations.len(),
        dataset.commentaries.len()
    ));
    Ok(generate_output_files(&dataset, settings)?)
}
