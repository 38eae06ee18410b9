//! `reproto backends` - list registered code generation backends.

/// Print one line per backend: name, language and file extension.
pub fn run() -> i32 {
    for backend in reproto_codegen::backends() {
        println!(
            "{:<8} {:<11} .{}",
            backend.name(),
            backend.language(),
            backend.extension()
        );
    }
    0
}
