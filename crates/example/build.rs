use std::env;
use std::path::PathBuf;

use tagwire_codegen::CodeGenerator;

fn main() {
    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap());
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    let mut codegen = CodeGenerator::new();
    codegen.set_header(
        "Generated codecs for tagwire-example\n\
         These match the annotated structs in src/model.rs",
    );

    // Picks up every struct annotated with #[derive(JsonCodec)]
    codegen
        .add_source_dir(manifest_dir.join("src"))
        .expect("Failed to parse sources");

    let generation = codegen
        .write_to_dir(out_dir.join("tagwire"))
        .expect("Failed to write codecs");
    for failure in &generation.failures {
        println!("cargo:warning={failure}");
    }

    println!("cargo:rerun-if-changed=src");
    println!("cargo:rerun-if-changed=build.rs");
}
