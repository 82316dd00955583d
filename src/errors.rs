//! Error module. See the [error-chain](https://crates.io/crates/error-chain) crate for details.

// error_chain! expands to code that trips this lint on newer compilers.
#![allow(deprecated)]

error_chain! {
    foreign_links {
        Docopt(::docopt::Error);
        Io(::std::io::Error);
        Nix(::nix::Error);
    }

    errors {
        TooManyArguments(max: usize) {
            description("too many arguments")
            display("too many arguments (maximum is {})", max)
        }

        Fork {
            description("fork failed")
            display("fork failed")
        }

        InvalidWord(word: String) {
            description("word contains a nul byte")
            display("{}: word contains a nul byte", word)
        }
    }
}
