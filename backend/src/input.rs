//! Input files and dispatch to the dialect parsers.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ParseError, Result};
use crate::logger::Log;
use crate::parser::beblia_xml_parser::{is_beblia_xml, BebliaXmlParser};
use crate::parser::codex_parser::CodexParser;
use crate::parser::commentary_csv_parser::CommentaryCsvParser;
use crate::parser::markup_parser::MarkupParser;
use crate::parser::tyndale_xml_parser::TyndaleXmlParser;
use crate::parser::usx_parser::UsxParser;
use crate::types::{CommentaryParseTree, ParseTree};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InputFileType {
    #[serde(rename = "markup")]
    Markup,
    #[serde(rename = "beblia-xml")]
    BebliaXml,
    #[serde(rename = "commentary/csv")]
    CommentaryCsv,
    #[serde(rename = "commentary/tyndale-xml", alias = "tyndale-xml")]
    TyndaleXml,
    #[serde(rename = "codex")]
    Codex,
    #[serde(rename = "usx")]
    Usx,
}

impl InputFileType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InputFileType::Markup => "markup",
            InputFileType::BebliaXml => "beblia-xml",
            InputFileType::CommentaryCsv => "commentary/csv",
            InputFileType::TyndaleXml => "commentary/tyndale-xml",
            InputFileType::Codex => "codex",
            InputFileType::Usx => "usx",
        }
    }

    pub fn is_commentary(&self) -> bool {
        matches!(self, InputFileType::CommentaryCsv | InputFileType::TyndaleXml)
    }

    /// Guess the type from a file extension, looking at the content for XML.
    pub fn infer(extension: &str, content: &str) -> Option<Self> {
        match extension.to_lowercase().as_str() {
            "txt" => Some(InputFileType::Markup),
            "csv" => Some(InputFileType::CommentaryCsv),
            "codex" | "json" => Some(InputFileType::Codex),
            "usx" => Some(InputFileType::Usx),
            "xml" if content.contains("<usx") => Some(InputFileType::Usx),
            "xml" if is_beblia_xml(content) => Some(InputFileType::BebliaXml),
            "xml" if content.contains("<items") => Some(InputFileType::TyndaleXml),
            _ => None,
        }
    }
}

impl fmt::Display for InputFileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextDirection {
    #[default]
    Ltr,
    Rtl,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputTranslationMetadata {
    pub id: String,
    pub name: String,
    pub english_name: String,
    pub short_name: String,
    pub website: String,
    pub license_url: String,
    #[serde(default)]
    pub license_notes: Option<String>,
    pub language: String,
    #[serde(default)]
    pub direction: TextDirection,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputCommentaryMetadata {
    pub id: String,
    pub name: String,
    pub english_name: String,
    pub website: String,
    pub license_url: String,
    #[serde(default)]
    pub license_notes: Option<String>,
    pub language: String,
    #[serde(default)]
    pub direction: TextDirection,
}

/// Written as `{"translation": {...}}` or `{"commentary": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputMetadata {
    Translation(InputTranslationMetadata),
    Commentary(InputCommentaryMetadata),
}

impl InputMetadata {
    pub fn kind(&self) -> &'static str {
        match self {
            InputMetadata::Translation(_) => "translation",
            InputMetadata::Commentary(_) => "commentary",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub file_type: InputFileType,
    pub metadata: InputMetadata,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
}

impl InputFile {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("<unnamed>")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParsedInput {
    Scripture(Vec<ParseTree>),
    Commentary(CommentaryParseTree),
}

/// Parse one input file with the parser for its type.
///
/// Scripture types need translation metadata and commentary types need
/// commentary metadata.
pub fn parse_input_file(file: &InputFile, log: &dyn Log) -> Result<ParsedInput> {
    let metadata_matches = match file.metadata {
        InputMetadata::Translation(_) => !file.file_type.is_commentary(),
        InputMetadata::Commentary(_) => file.file_type.is_commentary(),
    };
    if !metadata_matches {
        return Err(ParseError::UnsupportedFileType {
            file_type: file.file_type.to_string(),
            metadata: file.metadata.kind().to_string(),
        });
    }

    let parsed = match file.file_type {
        InputFileType::Markup => ParsedInput::Scripture(MarkupParser::new().parse(&file.content, log)),
        InputFileType::BebliaXml => {
            let doc = BebliaXmlParser::load(&file.content, log)?;
            ParsedInput::Scripture(doc.parse_all_books())
        }
        InputFileType::Codex => ParsedInput::Scripture(CodexParser::parse(&file.content, log)?),
        InputFileType::Usx => ParsedInput::Scripture(vec![UsxParser::parse(&file.content, log)?]),
        InputFileType::CommentaryCsv => ParsedInput::Commentary(CommentaryCsvParser::parse(&file.content, log)?),
        InputFileType::TyndaleXml => ParsedInput::Commentary(TyndaleXmlParser::parse(&file.content, log)?),
    };

    Ok(parsed)
}
