use clap::Parser;

/// This program answers score and turnout queries over consolidated
/// election results.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path) The JSON file describing the territories, the polling dates and the
    /// recorded elections. Per-commune result rows may be pulled from Excel files
    /// referenced by the dataset.
    #[clap(short, long, value_parser)]
    pub data: String,

    /// (date, YYYY-MM-DD) The polling date of the election to query.
    #[clap(short, long, value_parser)]
    pub echeance: String,

    /// The category of the polling date: municipales, cantonales, departementales,
    /// regionales, legislatives, europeennes, presidentielle or referendum.
    #[clap(long, value_parser)]
    pub categorie: String,

    /// The territory to query: 'pays', or an echelon:code reference such as
    /// 'region:11', 'departement:92', 'commune:92250', 'arrondissement:056AR01',
    /// 'legislative:1' or 'circonscription:1'.
    #[clap(short, long, value_parser)]
    pub territoire: String,

    /// (optional) The family name of the candidate to score. When several candidates
    /// carry this name for the polling date, their vote counts are summed.
    #[clap(short, long, value_parser)]
    pub candidat: Option<String>,

    /// (optional, repeatable) Nuance tags: scores every candidate whose nuance is in
    /// the given set. Mutually exclusive with --candidat.
    #[clap(long, value_parser)]
    pub nuances: Option<Vec<String>>,

    /// (file path, 'stdout' or empty) If specified, the JSON summary of the query will
    /// be written to the given location.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path) A reference JSON summary. If provided, datelec will check that the
    /// computed summary matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
