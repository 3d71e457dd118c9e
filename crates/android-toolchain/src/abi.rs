//! Target ABIs

use std::fmt;
use std::str::FromStr;

/// ABI parse error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("ABI '{0}' is not recognized")]
pub struct UnknownAbi(pub String);

/// Target ABI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Abi {
    Arm64V8a,
    ArmeabiV7a,
    X86,
    X86_64,
}

impl Abi {
    /// Name as passed in `ANDROID_ABI`
    pub fn abi_name(&self) -> &'static str {
        match self {
            Abi::Arm64V8a => "arm64-v8a",
            Abi::ArmeabiV7a => "armeabi-v7a",
            Abi::X86 => "x86",
            Abi::X86_64 => "x86_64",
        }
    }

    /// Architecture suffix of legacy `platforms/android-N/arch-*` folders
    pub fn architecture(&self) -> &'static str {
        match self {
            Abi::Arm64V8a => "arm64",
            Abi::ArmeabiV7a => "arm",
            Abi::X86 => "x86",
            Abi::X86_64 => "x86_64",
        }
    }
}

impl FromStr for Abi {
    type Err = UnknownAbi;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "arm64-v8a" => Ok(Abi::Arm64V8a),
            "armeabi-v7a" => Ok(Abi::ArmeabiV7a),
            "x86" => Ok(Abi::X86),
            "x86_64" => Ok(Abi::X86_64),
            _ => Err(UnknownAbi(s.to_string())),
        }
    }
}

impl fmt::Display for Abi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.abi_name())
    }
}
