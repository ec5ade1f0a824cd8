pub mod beblia_xml_parser;
pub mod codex_parser;
pub mod commentary_csv_parser;
pub mod iterators;
pub mod markup_parser;
pub mod markup_tokens;
pub mod tyndale_xml_parser;
pub mod usx_parser;
pub mod xml_dom;
