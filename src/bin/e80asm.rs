use std::io::{self, BufReader, Read};
use std::process;
use std::{env, fs::File};

use e80asm::assembler::{self, Error, ErrorKind};
use e80asm::logging;

fn main() {
    eprint!("Assembling... ");

    // open the template early so a missing file fails before any input
    // has been typed in
    let template = match File::open(assembler::TEMPLATE) {
        Ok(file) => file,
        Err(_) => fail(Error::new(ErrorKind::OpenTemplate)),
    };

    // starting message (hidden by the /Q switch)
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 || !args[1].eq_ignore_ascii_case("/Q") {
        eprintln!(
            "\nE80 CPU Assembler v{}\n\n\
            Translates an E80-assembly program to firmware VHDL code.\n\n\
            e80asm [/Q]\n\n\
            \x20 /Q          Silent mode, hides this message.\n\n\
            I/O is handled via stdin/stdout. Eg. to read 'program.e80asm'\n\
            and write the result to 'firmware.vhd', type:\n\n\
            e80asm < program.e80asm > firmware.vhd\n\n\
            You can also paste your code here and then press\n\
            Ctrl-D & [Enter] to translate it, or Ctrl-C to exit.\n",
            env!("CARGO_PKG_VERSION")
        );
    }

    // the assembler is byte-oriented; accept non-UTF-8 input lossily
    let mut raw = Vec::new();
    if let Err(error) = io::stdin().read_to_end(&mut raw) {
        logging::error(format!("failed to read standard input: {}", error));
        process::exit(1);
    }
    let source = String::from_utf8_lossy(&raw);

    let image = match assembler::assemble(&source) {
        Ok(image) => image,
        Err(error) => fail(error),
    };

    if let Err(error) = image.render(BufReader::new(template), io::stdout().lock()) {
        logging::error(format!("failed to write the firmware image: {}", error));
        process::exit(1);
    }

    eprintln!("Done.");
}

fn fail(error: Error) -> ! {
    logging::error(&error);
    process::exit(error.kind().code());
}
