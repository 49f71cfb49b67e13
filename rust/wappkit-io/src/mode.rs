//! Parsing of native open-mode strings (`"r"`, `"w+"`, `"ab"`, `"rb+"`, ...).

use std::{fmt, fs::OpenOptions, str::FromStr};

use wappkit_common::{Error, Result};

/// The base disposition selected by the leading letter of a mode string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// `r`: open an existing file.
    Read,
    /// `w`: create or truncate.
    Write,
    /// `a`: create if missing, every write appends.
    Append,
    /// `x`: create a new file, fail if it exists.
    CreateNew,
    /// `c`: create if missing, never truncate.
    Create,
}

impl Disposition {
    fn letter(self) -> char {
        match self {
            Disposition::Read => 'r',
            Disposition::Write => 'w',
            Disposition::Append => 'a',
            Disposition::CreateNew => 'x',
            Disposition::Create => 'c',
        }
    }
}

/// A parsed open mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenMode {
    disposition: Disposition,
    update: bool,
    binary: bool,
    text: bool,
}

impl OpenMode {
    /// `"r+b"`: read/write binary, the mode temporary streams are opened with.
    pub const READ_WRITE_BINARY: OpenMode = OpenMode {
        disposition: Disposition::Read,
        update: true,
        binary: true,
        text: false,
    };

    pub fn parse(mode: &str) -> Result<OpenMode> {
        let mut chars = mode.chars();
        let disposition = match chars.next() {
            Some('r') => Disposition::Read,
            Some('w') => Disposition::Write,
            Some('a') => Disposition::Append,
            Some('x') => Disposition::CreateNew,
            Some('c') => Disposition::Create,
            _ => return Err(Error::invalid_mode(mode)),
        };

        let mut result = OpenMode {
            disposition,
            update: false,
            binary: false,
            text: false,
        };
        for c in chars {
            let flag = match c {
                '+' => &mut result.update,
                'b' => &mut result.binary,
                't' => &mut result.text,
                _ => return Err(Error::invalid_mode(mode)),
            };
            if *flag {
                return Err(Error::invalid_mode(mode));
            }
            *flag = true;
        }
        if result.binary && result.text {
            return Err(Error::invalid_mode(mode));
        }
        Ok(result)
    }

    pub fn disposition(&self) -> Disposition {
        self.disposition
    }

    pub fn is_readable(&self) -> bool {
        self.update || self.disposition == Disposition::Read
    }

    pub fn is_writable(&self) -> bool {
        self.update || self.disposition != Disposition::Read
    }

    pub fn is_append(&self) -> bool {
        self.disposition == Disposition::Append
    }

    /// Translates the mode into `OpenOptions` for a filesystem target.
    pub fn to_open_options(&self) -> OpenOptions {
        let mut options = OpenOptions::new();
        options.read(self.is_readable());
        match self.disposition {
            Disposition::Read => {
                options.write(self.update);
            }
            Disposition::Write => {
                options.write(true).create(true).truncate(true);
            }
            Disposition::Append => {
                options.append(true).create(true);
            }
            Disposition::CreateNew => {
                options.write(true).create_new(true);
            }
            Disposition::Create => {
                options.write(true).create(true);
            }
        }
        options
    }

    /// Canonical text of the mode: letter, then `+`, then `b` or `t`.
    pub fn as_str(&self) -> String {
        let mut s = String::with_capacity(3);
        s.push(self.disposition.letter());
        if self.update {
            s.push('+');
        }
        if self.binary {
            s.push('b');
        } else if self.text {
            s.push('t');
        }
        s
    }
}

impl FromStr for OpenMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        OpenMode::parse(s)
    }
}

impl fmt::Display for OpenMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str())
    }
}
