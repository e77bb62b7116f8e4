//! Look up a single line of a text file by its line number

#[async_std::main]
async fn main() {
    // The first call scans the file and writes `<file>.idx`; subsequent
    // calls reuse the side-car index as long as the file stays unchanged
    let line = nthline::find_line("<some large text file>", 30).await.unwrap();

    println!("{}", line);
}
