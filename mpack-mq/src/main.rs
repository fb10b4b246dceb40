mod parser;
mod printer;

use mpack::*;
use std::io::{self, Read};
use anyhow::{Context, Result};
use structopt::StructOpt;
use std::str::from_utf8;

use printer::Pretty;

/// Decode and print MessagePack values
#[derive(StructOpt)]
#[structopt(name = "mq", author = "Liv Fischer")]
struct Opt {
    /// parse a textual representation and encode it into MessagePack instead
    #[structopt(short, long)]
    encode: bool,
    /// encode strings and binary data for readers predating the 2013 revision of MessagePack
    #[structopt(long)]
    old_spec: bool,
    /// reject input nested deeper than this
    #[structopt(long, default_value = "500")]
    max_depth: usize,
}

fn main() -> Result<()> {
    let opt = Opt::from_args();
    let mut buffer = Vec::new();
    io::stdin().read_to_end(&mut buffer).context("Failed to read stdin")?;
    if opt.encode {
        encode(&buffer, &opt)
    } else {
        print(&buffer, &opt)
    }
}

/// Prints every value of the input, which may consist of several concatenated documents.
fn print(buffer: &[u8], opt: &Opt) -> Result<()> {
    let decoder = Decoder::new().max_depth(opt.max_depth);
    let mut reader = Reader::new(buffer);
    while !reader.end_of_stream() {
        let value = decoder.read(&mut reader).context("Decoding error")?;
        println!("{}", Pretty(&value));
    }
    Ok(())
}

fn encode(buffer: &[u8], opt: &Opt) -> Result<()> {
    let string = from_utf8(buffer).context("input is not utf-8")?;
    let values = parser::parse(string)?;
    let stdout = io::stdout();
    let mut writer = Writer::new(IoSink::new(stdout.lock())).old_spec(opt.old_spec);
    for value in values.iter() {
        Encoder::encode(value, &mut writer).context("Encoding error")?;
    }
    writer.flush().context("Failed to write stdout")?;
    Ok(())
}
