use super::Error;

use std::fmt;
use std::str::FromStr;

/// How the remote file is accessed.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Access {
    /// Open an existing file for reading.
    Read,
    /// Create the file, truncating it if it exists.
    Write,
    /// Create the file if missing, writes go to its end.
    Append,
}

/// Mode a remote file is opened in, parsed from `"r"`, `"rb"`, `"w"`,
/// `"wb"`, `"a"` or `"ab"`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct OpenMode {
    access: Access,
    binary: bool,
}

impl OpenMode {
    /// `"rb"`
    pub const READ: Self = Self::new(Access::Read, true);

    /// `"wb"`
    pub const WRITE: Self = Self::new(Access::Write, true);

    pub const fn new(access: Access, binary: bool) -> Self {
        Self { access, binary }
    }

    pub const fn access(self) -> Access {
        self.access
    }

    pub const fn is_binary(self) -> bool {
        self.binary
    }

    /// True for write and append modes.
    pub const fn is_writable(self) -> bool {
        !matches!(self.access, Access::Read)
    }
}

impl Default for OpenMode {
    fn default() -> Self {
        Self::new(Access::Read, false)
    }
}

impl FromStr for OpenMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (access, binary) = match s {
            "r" => (Access::Read, false),
            "rb" => (Access::Read, true),
            "w" => (Access::Write, false),
            "wb" => (Access::Write, true),
            "a" => (Access::Append, false),
            "ab" => (Access::Append, true),
            _ => return Err(Error::InvalidMode(s.to_owned())),
        };

        Ok(Self::new(access, binary))
    }
}

impl TryFrom<&str> for OpenMode {
    type Error = Error;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl fmt::Display for OpenMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let access = match self.access {
            Access::Read => "r",
            Access::Write => "w",
            Access::Append => "a",
        };
        f.write_str(access)?;
        if self.binary {
            f.write_str("b")?;
        }
        Ok(())
    }
}
