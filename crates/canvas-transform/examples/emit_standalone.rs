use canvas_transform::{convert, ConvertOptions, SAMPLE_COMPONENT};
use std::fs;

fn main() {
    let source = match std::env::args().nth(1) {
        Some(path) => fs::read_to_string(&path).expect("Failed to read file"),
        None => SAMPLE_COMPONENT.to_string(),
    };
    let result = convert(&source, &ConvertOptions::default()).expect("Input is empty");
    println!("<!-- {} -->", result.artifacts.markup_file_name);
    println!("{}", result.artifacts.markup_text);
    println!("// {}", result.artifacts.script_file_name);
    println!("{}", result.artifacts.script_text);
}
