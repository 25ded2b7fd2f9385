pub(crate) mod help;


#[derive(Debug, PartialEq)]
pub(crate) struct TshOptions {
    pub(crate) verbose: bool,
    pub(crate) prompt: bool,
    pub(crate) action: TshAction,
}

impl Default for TshOptions {
    fn default() -> Self {
        Self {
            verbose: false,
            prompt: true,
            action: TshAction::Run,
        }
    }
}

#[derive(Debug, PartialEq)]
pub(crate) enum TshAction {
    Help,
    Run,
}

type OptionSetter = fn(&mut TshOptions);

struct TshOption {
    short: char,
    long: &'static str,
    set: OptionSetter,
}

impl TshOptions {
    const TSH_OPTIONS: &[TshOption] = &[
        TshOption {
            short: 'h',
            long: "help",
            set: |options| options.action = TshAction::Help,
        },
        TshOption {
            short: 'p',
            long: "no-prompt",
            set: |options| options.prompt = false,
        },
        TshOption {
            short: 'v',
            long: "verbose",
            set: |options| options.verbose = true,
        },
    ];

    pub(crate) fn from_env() -> Result<TshOptions, String> {
        let args = std::env::args().collect();

        Self::parse_arguments(args)
    }

    /// parse tsh arguments into a TshOptions struct
    pub(crate) fn parse_arguments(arguments: Vec<String>) -> Result<TshOptions, String> {
        let mut options = TshOptions::default();

        for arg in arguments.into_iter().skip(1) {
            // if the argument starts with -- it must be a full length option name
            if let Some(name) = arg.strip_prefix("--") {
                if let Some((key, _)) = name.split_once('=') {
                    if Self::TSH_OPTIONS.iter().any(|o| o.long == key) {
                        Err(format!("'--{key}' does not take any arguments"))?;
                    }
                    Err(format!("unrecognized option '{arg}'"))?;
                }

                let option = Self::TSH_OPTIONS
                    .iter()
                    .find(|o| o.long == name)
                    .ok_or_else(|| format!("unrecognized option '{arg}'"))?;
                (option.set)(&mut options);
            } else if let Some(flags) = arg.strip_prefix('-').filter(|flags| !flags.is_empty()) {
                // flags can be grouped, so we loop over the characters
                for flag in flags.chars() {
                    let option = Self::TSH_OPTIONS
                        .iter()
                        .find(|o| o.short == flag)
                        .ok_or_else(|| format!("unrecognized option '{flag}'"))?;
                    (option.set)(&mut options);
                }
            } else {
                Err(format!("unexpected argument '{arg}'"))?;
            }
        }

        Ok(options)
    }
}
