use std::fmt;
use std::str::FromStr;

/// Opt-in trap routines beyond the standard set.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Features {
    /// `TRAP x26`: print R0 as a signed decimal.
    pub putn: bool,
    /// `TRAP x27`: print every register.
    pub reg: bool,
}

impl FromStr for Features {
    type Err = String;
    fn from_str(string: &str) -> Result<Self, Self::Err> {
        let mut features = Self::default();
        for word in string.split(',') {
            let word = word.trim();
            let value = match word {
                "" => continue,
                "putn" => &mut features.putn,
                "reg" => &mut features.reg,
                _ => return Err(format!("Unknown feature '{}'", word)),
            };
            if *value {
                return Err(format!("Cannot specify feature '{}' twice", word));
            }
            *value = true;
        }
        Ok(features)
    }
}

impl fmt::Display for Features {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let features = [("putn", self.putn), ("reg", self.reg)];
        let mut has_any_feature = false;
        for (name, value) in features {
            if !value {
                continue;
            }
            if has_any_feature {
                write!(f, ",")?;
            }
            write!(f, "{}", name)?;
            has_any_feature = true;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_lists() {
        assert_eq!("".parse::<Features>().unwrap(), Features::default());
        assert_eq!(
            "putn".parse::<Features>().unwrap(),
            Features {
                putn: true,
                reg: false
            }
        );
        assert_eq!(
            "reg, putn,".parse::<Features>().unwrap(),
            Features {
                putn: true,
                reg: true
            }
        );
    }

    #[test]
    fn rejects_bad_lists() {
        assert_eq!(
            "stack".parse::<Features>(),
            Err("Unknown feature 'stack'".to_string())
        );
        assert_eq!(
            "reg,reg".parse::<Features>(),
            Err("Cannot specify feature 'reg' twice".to_string())
        );
        assert_eq!(
            "putn, bogus".parse::<Features>(),
            Err("Unknown feature 'bogus'".to_string())
        );
        assert_eq!(
            "reg, reg".parse::<Features>(),
            Err("Cannot specify feature 'reg' twice".to_string())
        );
    }

    #[test]
    fn displays_enabled() {
        let features = Features {
            putn: true,
            reg: true,
        };
        assert_eq!(features.to_string(), "putn,reg");
        assert_eq!(Features::default().to_string(), "");
    }
}
