use log::{debug, info, warn};

use scrutin::*;
use snafu::{prelude::*, Snafu};

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;
use crate::requete::dataset_reader::*;

pub mod io_xlsx;

#[derive(Debug, Snafu)]
pub enum DatelecError {
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display(""))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Cannot understand date {date}, expected YYYY-MM-DD"))]
    ParsingDate { date: String },
    #[snafu(display("Unknown echeance category {categorie}"))]
    ParsingCategorie { categorie: String },
    #[snafu(display("Cannot resolve territory reference {reference}"))]
    TerritoireInconnu { reference: String },
    #[snafu(display("No candidate named {nom} for this echeance"))]
    CandidatInconnu { nom: String },
    #[snafu(display("Invalid territory data: {source}"))]
    Territoire { source: ErreurValidation },
    #[snafu(display("The dataset breaks a uniqueness rule: {source}"))]
    Conflit { source: ConflitUnicite },
    #[snafu(display("Error opening file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display(""))]
    EmptyExcel {},
    #[snafu(display("Error writing file {path}"))]
    WritingSummary {
        source: std::io::Error,
        path: String,
    },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type DatelecResult<T> = Result<T, DatelecError>;

pub mod dataset_reader {
    use crate::requete::*;
    use std::collections::BTreeMap;

    #[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
    pub struct RegionData {
        pub code: String,
        pub nom: String,
        #[serde(rename = "circonscriptionEuropeenne")]
        pub circonscription_europeenne: Option<String>,
    }

    #[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
    pub struct CirconscriptionEuropeenneData {
        pub code: String,
        pub nom: String,
    }

    #[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
    pub struct DepartementData {
        pub code: String,
        pub nom: String,
        pub region: String,
    }

    #[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
    pub struct CommuneData {
        pub code: String,
        pub nom: String,
        pub departement: String,
    }

    #[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
    pub struct ArrondissementData {
        pub code: String,
        pub nom: String,
        pub commune: String,
    }

    #[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
    pub struct CirconscriptionLegislativeData {
        pub code: u32,
        pub departement: String,
    }

    #[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
    pub struct EcheanceData {
        pub date: String,
        pub categorie: String,
    }

    #[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
    pub struct CandidatData {
        pub nom: String,
        pub prenom: Option<String>,
        pub nuance: Option<String>,
    }

    /// One row of figures, entered at the election's anchor unless a
    /// territory reference is given. The voix map is keyed by candidate
    /// family name.
    #[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
    pub struct ResultatData {
        pub territoire: Option<String>,
        pub inscrits: Option<u64>,
        pub votants: Option<u64>,
        pub exprimes: Option<u64>,
        pub voix: Option<BTreeMap<String, u64>>,
    }

    #[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
    pub struct SourceData {
        pub provider: String,
        #[serde(rename = "filePath")]
        pub file_path: String,
        #[serde(rename = "worksheetName")]
        pub worksheet_name: Option<String>,
    }

    #[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
    pub struct ElectionData {
        pub echeance: EcheanceData,
        pub circonscription: String,
        pub candidats: Vec<CandidatData>,
        #[serde(default)]
        pub resultats: Vec<ResultatData>,
        #[serde(default)]
        pub sources: Vec<SourceData>,
    }

    #[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
    pub struct Dataset {
        pub pays: String,
        #[serde(default)]
        pub regions: Vec<RegionData>,
        #[serde(rename = "circonscriptionsEuropeennes", default)]
        pub circonscriptions_europeennes: Vec<CirconscriptionEuropeenneData>,
        #[serde(default)]
        pub departements: Vec<DepartementData>,
        #[serde(default)]
        pub communes: Vec<CommuneData>,
        #[serde(default)]
        pub arrondissements: Vec<ArrondissementData>,
        #[serde(rename = "circonscriptionsLegislatives", default)]
        pub circonscriptions_legislatives: Vec<CirconscriptionLegislativeData>,
        pub elections: Vec<ElectionData>,
    }

    pub fn parse_dataset(contents: &str) -> DatelecResult<Dataset> {
        serde_json::from_str(contents).context(ParsingJsonSnafu {})
    }

    pub fn read_dataset(path: &str) -> DatelecResult<Dataset> {
        let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
        debug!("read_dataset: {} bytes", contents.len());
        parse_dataset(contents.as_str())
    }

    pub fn parse_date(date: &str) -> DatelecResult<NaiveDate> {
        NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .ok()
            .context(ParsingDateSnafu { date })
    }

    pub fn parse_categorie(categorie: &str) -> DatelecResult<CategorieEcheance> {
        match categorie {
            "municipales" => Ok(CategorieEcheance::Municipales),
            "cantonales" => Ok(CategorieEcheance::Cantonales),
            "departementales" => Ok(CategorieEcheance::Departementales),
            "regionales" => Ok(CategorieEcheance::Regionales),
            "legislatives" => Ok(CategorieEcheance::Legislatives),
            "europeennes" => Ok(CategorieEcheance::Europeennes),
            "presidentielle" => Ok(CategorieEcheance::Presidentielle),
            "referendum" => Ok(CategorieEcheance::Referendum),
            _ => ParsingCategorieSnafu { categorie }.fail(),
        }
    }

    pub fn parse_echeance(data: &EcheanceData) -> DatelecResult<Echeance> {
        Ok(Echeance::nouvelle(
            parse_date(&data.date)?,
            parse_categorie(&data.categorie)?,
        ))
    }

    /// Resolves a 'pays' or 'echelon:code' reference against the
    /// hierarchy. Dataset codes are expected to be unique per echelon.
    pub fn resoud_territoire(
        territoires: &Territoires,
        reference: &str,
    ) -> DatelecResult<TerritoireId> {
        if reference == "pays" {
            return Ok(territoires.pays());
        }
        let (echelon, code) = reference
            .split_once(':')
            .context(TerritoireInconnuSnafu { reference })?;
        let echelon = match echelon {
            "region" => Echelon::Region,
            "departement" => Echelon::Departement,
            "commune" => Echelon::Commune,
            "arrondissement" => Echelon::ArrondissementCommunal,
            "legislative" => Echelon::CirconscriptionLegislative,
            "circonscription" => Echelon::CirconscriptionEuropeenne,
            _ => return TerritoireInconnuSnafu { reference }.fail(),
        };
        territoires
            .cherche(echelon, code)
            .context(TerritoireInconnuSnafu { reference })
    }
}

pub fn construire_territoires(data: &Dataset) -> DatelecResult<Territoires> {
    let mut territoires = Territoires::nouveau(&data.pays).context(TerritoireSnafu {})?;
    for circonscription in &data.circonscriptions_europeennes {
        territoires
            .ajoute_circonscription_europeenne(&circonscription.code, &circonscription.nom)
            .context(TerritoireSnafu {})?;
    }
    for region in &data.regions {
        let id = territoires
            .ajoute_region(&region.code, &region.nom)
            .context(TerritoireSnafu {})?;
        if let Some(code) = &region.circonscription_europeenne {
            let reference = format!("circonscription:{}", code);
            let circonscription = resoud_territoire(&territoires, &reference)?;
            territoires
                .rattache_region(circonscription, id)
                .context(TerritoireSnafu {})?;
        }
    }
    for departement in &data.departements {
        let region =
            resoud_territoire(&territoires, &format!("region:{}", departement.region))?;
        territoires
            .ajoute_departement(region, &departement.code, &departement.nom)
            .context(TerritoireSnafu {})?;
    }
    for commune in &data.communes {
        let departement =
            resoud_territoire(&territoires, &format!("departement:{}", commune.departement))?;
        territoires
            .ajoute_commune(departement, &commune.code, &commune.nom)
            .context(TerritoireSnafu {})?;
    }
    for arrondissement in &data.arrondissements {
        let commune =
            resoud_territoire(&territoires, &format!("commune:{}", arrondissement.commune))?;
        territoires
            .ajoute_arrondissement(commune, &arrondissement.code, &arrondissement.nom)
            .context(TerritoireSnafu {})?;
    }
    for circonscription in &data.circonscriptions_legislatives {
        let departement = resoud_territoire(
            &territoires,
            &format!("departement:{}", circonscription.departement),
        )?;
        territoires
            .ajoute_circonscription_legislative(departement, circonscription.code)
            .context(TerritoireSnafu {})?;
    }
    Ok(territoires)
}

fn applique_resultat(
    election: &mut Election,
    territoires: &Territoires,
    candidats: &[(String, CandidatId)],
    resultat: &ResultatData,
) -> DatelecResult<()> {
    let cible = match &resultat.territoire {
        Some(reference) => Some(resoud_territoire(territoires, reference)?),
        None => None,
    };
    match (resultat.inscrits, resultat.votants, resultat.exprimes) {
        (Some(inscrits), Some(votants), Some(exprimes)) => {
            election.fixe_vote_info(VoteInfo::nouveau(inscrits, votants, exprimes), cible);
        }
        (None, None, None) => {}
        _ => {
            whatever!("inscrits, votants and exprimes must be provided together");
        }
    }
    if let Some(voix) = &resultat.voix {
        for (nom, nombre) in voix {
            let candidat = candidats
                .iter()
                .find(|(n, _)| n == nom)
                .map(|(_, id)| *id)
                .context(CandidatInconnuSnafu { nom })?;
            election.fixe_voix(*nombre, candidat, cible);
        }
    }
    Ok(())
}

pub fn construire_elections(
    data: &Dataset,
    territoires: &Territoires,
    racine: &Path,
) -> DatelecResult<ElectionRepository> {
    let mut repository = ElectionRepository::nouveau();
    for election_data in &data.elections {
        let echeance = parse_echeance(&election_data.echeance)?;
        let circonscription = resoud_territoire(territoires, &election_data.circonscription)?;
        let mut election = Election::nouvelle(echeance, circonscription);

        let mut candidats: Vec<(String, CandidatId)> = Vec::new();
        for candidat_data in &election_data.candidats {
            let id = election.ajoute_candidat(Candidat::nouveau(
                candidat_data.nuance.as_deref().unwrap_or(""),
                candidat_data.prenom.as_deref().unwrap_or(""),
                &candidat_data.nom,
            ));
            candidats.push((candidat_data.nom.clone(), id));
        }

        for resultat in &election_data.resultats {
            applique_resultat(&mut election, territoires, &candidats, resultat)?;
        }

        for source in &election_data.sources {
            let chemin: PathBuf = [racine, Path::new(&source.file_path)].iter().collect();
            let chemin = chemin.as_path().display().to_string();
            info!("Attempting to read result file {:?}", chemin);
            let lignes = match source.provider.as_str() {
                "xlsx" => io_xlsx::read_excel_file(chemin, source)?,
                x => {
                    whatever!("Provider not implemented {:?}", x)
                }
            };
            for ligne in &lignes {
                let resultat = ResultatData {
                    territoire: Some(format!("commune:{}", ligne.code)),
                    inscrits: ligne.inscrits,
                    votants: ligne.votants,
                    exprimes: ligne.exprimes,
                    voix: Some(ligne.voix.iter().cloned().collect()),
                };
                applique_resultat(&mut election, territoires, &candidats, &resultat)?;
            }
        }

        repository.ajoute(election);
    }
    repository.sauvegarde().context(ConflitSnafu {})?;
    Ok(repository)
}

/// Builds the candidate selection requested on the command line. A family
/// name selects every candidate carrying it for the echeance (their vote
/// counts are summed when there are several).
fn construire_selection(
    repository: &ElectionRepository,
    echeance: &Echeance,
    candidat: &Option<String>,
    nuances: &Option<Vec<String>>,
) -> DatelecResult<SelectionCandidats> {
    match (candidat, nuances) {
        (Some(nom), None) => {
            let mut paires: Vec<(ElectionId, CandidatId)> = Vec::new();
            for (id, election) in repository.elections() {
                if election.echeance() != echeance {
                    continue;
                }
                for (candidat_id, c) in election.candidats() {
                    if c.nom() == nom {
                        paires.push((id, candidat_id));
                    }
                }
            }
            match paires.len() {
                0 => CandidatInconnuSnafu { nom }.fail(),
                1 => Ok(SelectionCandidats::Unique(paires[0].0, paires[0].1)),
                _ => Ok(SelectionCandidats::Ensemble(paires)),
            }
        }
        (None, Some(nuances)) => Ok(SelectionCandidats::Nuances(nuances.clone())),
        _ => {
            whatever!("provide exactly one of --candidat and --nuances")
        }
    }
}

fn build_summary_js(
    args: &Args,
    score: &Score,
    participation: &VoteInfo,
) -> JSValue {
    let selection = match (&args.candidat, &args.nuances) {
        (Some(nom), _) => json!({ "candidat": nom }),
        (None, Some(nuances)) => json!({ "nuances": nuances }),
        _ => JSValue::Null,
    };
    json!({
        "requete": {
            "date": args.echeance,
            "categorie": args.categorie,
            "territoire": args.territoire,
            "selection": selection,
        },
        "score": {
            "voix": score.to_voix(),
            // two decimals, so that summaries compare reproducibly
            "pourcentage": score.to_pourcentage().map(|x| (x * 100.0).round() / 100.0),
        },
        "participation": {
            "inscrits": participation.inscrits(),
            "votants": participation.votants(),
            "exprimes": participation.exprimes(),
        },
    })
}

fn read_summary(path: &str) -> DatelecResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})
}

pub fn run_requete(args: &Args) -> DatelecResult<()> {
    let data_p = Path::new(args.data.as_str());
    let data = read_dataset(&args.data)?;
    info!(
        "dataset: {} elections over {} communes",
        data.elections.len(),
        data.communes.len()
    );

    let territoires = construire_territoires(&data)?;
    let racine = data_p.parent().unwrap_or_else(|| Path::new("."));
    let mut repository = construire_elections(&data, &territoires, racine)?;

    let echeance = Echeance::nouvelle(
        parse_date(&args.echeance)?,
        parse_categorie(&args.categorie)?,
    );
    let territoire = resoud_territoire(&territoires, &args.territoire)?;
    let selection = construire_selection(&repository, &echeance, &args.candidat, &args.nuances)?;

    let score = repository.score(&territoires, &echeance, territoire, &selection);
    let participation = repository.vote_info(&territoires, &echeance, territoire);
    info!("score: {:?} participation: {:?}", score, participation);

    let summary_js = build_summary_js(args, &score, &participation);
    let pretty_js = serde_json::to_string_pretty(&summary_js).context(ParsingJsonSnafu {})?;
    println!("resultat:{}", pretty_js);

    match args.out.as_deref() {
        None | Some("stdout") | Some("") => {}
        Some(path) => {
            fs::write(path, &pretty_js).context(WritingSummarySnafu { path })?;
        }
    }

    // The reference summary, if provided for comparison
    if let Some(reference_p) = &args.reference {
        let summary_ref = read_summary(reference_p)?;
        let pretty_js_ref =
            serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {})?;
        if pretty_js_ref != pretty_js {
            warn!("Found differences with the reference summary");
            print_diff(pretty_js_ref.as_str(), pretty_js.as_ref(), "\n");
            whatever!("Difference detected between computed summary and reference summary")
        }
    }

    Ok(())
}
