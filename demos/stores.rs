//! Use the compact binary side-car representation instead of the default
//! JSON one

use nthline::{find_line_with_store, BinaryStore};

#[async_std::main]
async fn main() {
    let line = find_line_with_store("<some large text file>", 30, &BinaryStore)
        .await
        .unwrap();

    println!("{}", line);
}
