pub fn run() -> anyhow::Result<()> {
    println!("tome {}", env!("CARGO_PKG_VERSION"));
    println!("Recursive summarization of book-length text through language models");
    Ok(())
}
