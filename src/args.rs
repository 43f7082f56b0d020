use clap::{Parser, Subcommand};

/// This is the operator desk for paper petition sheets.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) A JSON file with the desk settings (server address, timeouts, goal).
    /// For more information about the file format, read the manual of the petition_sheets crate.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (URL, optional) The address of the petition server. Setting this option overrides the
    /// address that may be specified with the --config option.
    #[clap(short, long, value_parser)]
    pub server: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Proposes a row from a list of occupied rows, without contacting the server.
    Allocate {
        /// (comma-separated integers, may be empty) The rows already recorded on the sheet.
        #[clap(long, value_parser, allow_hyphen_values = true)]
        occupied: String,
    },
    /// Fetches the rows recorded on a sheet and proposes the next one.
    NextRow {
        /// (sheet number, optional) Without it, the first row is proposed.
        #[clap(long, value_parser)]
        sheet: Option<String>,
    },
    /// Records a signature matched to a registered voter.
    Match {
        #[clap(flatten)]
        line: LineArgs,
        /// The identification number of the matched voter.
        #[clap(long, value_parser)]
        voter_id: String,
    },
    /// Records a signature that could not be matched to a voter.
    NotFound {
        #[clap(flatten)]
        line: LineArgs,
        #[clap(flatten)]
        person: PersonArgs,
    },
    /// Searches the voter file. `*` and `?` may be used as wildcards.
    Search {
        #[clap(flatten)]
        query: SearchArgs,
    },
    /// Moves a sheet from Printed to Signing, or from Signing to Summarizing.
    SheetStatus {
        #[clap(long, value_parser)]
        sheet: u64,
        /// The new status.
        #[clap(long, value_parser)]
        to: String,
        /// (optional) The current status. If given, the transition is checked before anything is sent.
        #[clap(long, value_parser)]
        from: Option<String>,
    },
    /// Closes a sheet that is being summarized.
    CloseSheet {
        #[clap(long, value_parser)]
        sheet: u64,
        /// The id of the notary (see the `notaries` command).
        #[clap(long, value_parser)]
        notary: u64,
        /// The id of the circulator (see the `circulators` command).
        #[clap(long, value_parser)]
        circulator: u64,
        /// (YYYY-MM-DD) The date of the notarization.
        #[clap(long, value_parser)]
        notarized_on: String,
    },
    /// Adds a closed sheet to the batch being built.
    AddToBatch {
        #[clap(long, value_parser)]
        sheet: u64,
    },
    /// Closes the batch being built.
    CloseBatch,
    /// Ships the closed batch.
    ShipBatch {
        #[clap(long, value_parser)]
        carrier: String,
        #[clap(long, value_parser)]
        tracking: String,
        /// (YYYY-MM-DD)
        #[clap(long, value_parser)]
        ship_date: String,
    },
    /// Prints the number of recorded signatures per status.
    Stats,
    /// Prints a sheet with its 12 rows.
    Print {
        #[clap(long, value_parser)]
        sheet: u64,
    },
    /// Lists the notaries known to the server.
    Notaries,
    /// Lists the circulators known to the server.
    Circulators,
}

/// Where a signature sits on paper.
#[derive(clap::Args, Debug, Clone)]
pub struct LineArgs {
    #[clap(long, value_parser)]
    pub sheet: u64,
    /// (optional) The row on the sheet. If not specified, the next available row is fetched from
    /// the server.
    #[clap(long, value_parser)]
    pub row: Option<u32>,
    /// (optional) Month of collection, the current month if not specified.
    #[clap(long, value_parser)]
    pub month: Option<u32>,
    /// (optional) Day of collection, the first of the month if not specified.
    #[clap(long, value_parser)]
    pub day: Option<u32>,
    /// (optional) Year of collection, the current year if not specified.
    #[clap(long, value_parser)]
    pub year: Option<i32>,
    /// (optional) Last four digits of the signer's SSN.
    #[clap(long, value_parser)]
    pub last4: Option<String>,
}

#[derive(clap::Args, Debug, Clone)]
pub struct PersonArgs {
    #[clap(long, value_parser)]
    pub first_name: String,
    #[clap(long, value_parser)]
    pub middle_name: Option<String>,
    #[clap(long, value_parser)]
    pub last_name: String,
    /// The street address as written on the sheet.
    #[clap(long, value_parser)]
    pub address: Option<String>,
    #[clap(long, value_parser)]
    pub apartment_number: Option<String>,
    #[clap(long, value_parser)]
    pub city: Option<String>,
    #[clap(long, value_parser)]
    pub state: Option<String>,
    #[clap(long, value_parser)]
    pub zip_code: Option<String>,
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct SearchArgs {
    #[clap(long, value_parser)]
    pub first_name: Option<String>,
    #[clap(long, value_parser)]
    pub middle_name: Option<String>,
    #[clap(long, value_parser)]
    pub last_name: Option<String>,
    #[clap(long, value_parser)]
    pub house_number: Option<String>,
    #[clap(long, value_parser)]
    pub house_number_suffix: Option<String>,
    #[clap(long, value_parser)]
    pub street_name: Option<String>,
    #[clap(long, value_parser)]
    pub apartment_number: Option<String>,
    #[clap(long, value_parser)]
    pub city: Option<String>,
    #[clap(long, value_parser)]
    pub state: Option<String>,
    /// Only the first five characters are used.
    #[clap(long, value_parser)]
    pub zip_code: Option<String>,
}
