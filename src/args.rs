use clap::{value_parser, Arg, ArgAction, Command};

/// Command line of the `raidz_test` binary
pub fn command() -> Command {
    Command::new("raidz_test")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Test and benchmark the RAID-Z parity implementations")
        .arg(
            Arg::new("ashift")
                .short('a')
                .help("ashift (default: 9)")
                .value_name("ASHIFT")
                .value_parser(value_parser!(u64)),
        )
        .arg(
            Arg::new("offset")
                .short('o')
                .help("zio offset for each raidz block, as 1 << N (default: 12)")
                .value_name("N")
                .value_parser(value_parser!(u64)),
        )
        .arg(
            Arg::new("dcols")
                .short('d')
                .help("number of raidz data columns (default: 8)")
                .value_name("COLS")
                .value_parser(value_parser!(u64)),
        )
        .arg(
            Arg::new("size")
                .short('s')
                .help("size of data to test, as 1 << N (default: 19)")
                .value_name("N")
                .value_parser(value_parser!(u64)),
        )
        .arg(
            Arg::new("sweep")
                .short('S')
                .help("Sweep parameters (-a, -o, -d, -s)")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("timeout")
                .short('t')
                .help("Timeout for the parameter sweep, in seconds")
                .value_name("SECS")
                .value_parser(value_parser!(u64)),
        )
        .arg(
            Arg::new("benchmark")
                .short('B')
                .help("Benchmark all implementations")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("expanded")
                .short('e')
                .help("Use an expanded raidz map")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("reflow")
                .short('r')
                .help("Reflow offset of the expanded map")
                .value_name("OFFSET")
                .value_parser(value_parser!(u64)),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .help("Increase verbosity")
                .action(ArgAction::Count),
        )
        .arg(
            Arg::new("sanity")
                .short('T')
                .help("Test the test: skip the operation under test so checks must fail")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("gdb")
                .short('D')
                .help("Attach gdb on SIGSEGV")
                .action(ArgAction::SetTrue),
        )
}

pub fn parse_args() -> clap::ArgMatches {
    command().get_matches()
}
