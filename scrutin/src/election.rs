// ********* Elections, candidates and result values ***********

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::territoire::TerritoireId;

/// The kind of contest held on a polling date.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum CategorieEcheance {
    Municipales,
    Cantonales,
    Departementales,
    Regionales,
    Legislatives,
    Europeennes,
    Presidentielle,
    Referendum,
}

/// A polling date plus its category. Two echeances are the same record
/// exactly when both coincide.
#[derive(Eq, PartialEq, Debug, Clone, Hash, Ord, PartialOrd)]
pub struct Echeance {
    date: NaiveDate,
    categorie: CategorieEcheance,
}

impl Echeance {
    pub fn nouvelle(date: NaiveDate, categorie: CategorieEcheance) -> Echeance {
        Echeance { date, categorie }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn categorie(&self) -> CategorieEcheance {
        self.categorie
    }
}

/// Turnout figures for one (echeance, territoire): registered voters,
/// ballots cast, valid ballots. A fully absent value means the turnout is
/// unknown, which is distinct from a turnout of zero.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct VoteInfo {
    inscrits: Option<u64>,
    votants: Option<u64>,
    exprimes: Option<u64>,
}

impl VoteInfo {
    pub const VIDE: VoteInfo = VoteInfo {
        inscrits: None,
        votants: None,
        exprimes: None,
    };

    pub fn nouveau(inscrits: u64, votants: u64, exprimes: u64) -> VoteInfo {
        VoteInfo {
            inscrits: Some(inscrits),
            votants: Some(votants),
            exprimes: Some(exprimes),
        }
    }

    pub fn inscrits(&self) -> Option<u64> {
        self.inscrits
    }

    pub fn votants(&self) -> Option<u64> {
        self.votants
    }

    pub fn exprimes(&self) -> Option<u64> {
        self.exprimes
    }

    pub fn est_vide(&self) -> bool {
        *self == VoteInfo::VIDE
    }

    /// Component-wise sum; a component stays absent only when absent on
    /// both sides.
    pub(crate) fn cumule(&self, autre: &VoteInfo) -> VoteInfo {
        fn composante(a: Option<u64>, b: Option<u64>) -> Option<u64> {
            match (a, b) {
                (None, None) => None,
                _ => Some(a.unwrap_or(0) + b.unwrap_or(0)),
            }
        }
        VoteInfo {
            inscrits: composante(self.inscrits, autre.inscrits),
            votants: composante(self.votants, autre.votants),
            exprimes: composante(self.exprimes, autre.exprimes),
        }
    }
}

/// A candidate score: a vote count and its share of the valid ballots.
/// Both are absent on an empty score; the share is also absent whenever
/// the valid-ballot denominator is unknown or zero.
#[derive(PartialEq, Debug, Clone, Copy)]
pub struct Score {
    voix: Option<u64>,
    pourcentage: Option<f64>,
}

impl Score {
    pub fn vide() -> Score {
        Score {
            voix: None,
            pourcentage: None,
        }
    }

    pub fn from_voix(voix: u64) -> Score {
        Score {
            voix: Some(voix),
            pourcentage: None,
        }
    }

    pub fn from_voix_et_exprimes(voix: u64, exprimes: Option<u64>) -> Score {
        let pourcentage = match exprimes {
            Some(total) if total > 0 => Some(voix as f64 / total as f64 * 100.0),
            _ => None,
        };
        Score {
            voix: Some(voix),
            pourcentage,
        }
    }

    pub fn to_voix(&self) -> Option<u64> {
        self.voix
    }

    pub fn to_pourcentage(&self) -> Option<f64> {
        self.pourcentage
    }

    pub fn est_vide(&self) -> bool {
        self.voix.is_none() && self.pourcentage.is_none()
    }
}

/// A contestant in one election, tagged with a political nuance used by
/// group-by-nuance queries.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct Candidat {
    nuance: String,
    prenom: String,
    nom: String,
}

impl Candidat {
    pub fn nouveau(nuance: &str, prenom: &str, nom: &str) -> Candidat {
        Candidat {
            nuance: nuance.to_string(),
            prenom: prenom.to_string(),
            nom: nom.to_string(),
        }
    }

    pub fn nuance(&self) -> &str {
        &self.nuance
    }

    pub fn prenom(&self) -> &str {
        &self.prenom
    }

    pub fn nom(&self) -> &str {
        &self.nom
    }
}

/// Handle to a candidate within its election.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub struct CandidatId(pub(crate) u32);

/// One recorded contest, anchored to exactly one (echeance, territoire)
/// pair. Turnout and per-candidate vote counts default to the anchor but
/// may be entered per sub-territory when the results exist at a finer
/// granularity than the anchor.
#[derive(PartialEq, Debug, Clone)]
pub struct Election {
    echeance: Echeance,
    circonscription: TerritoireId,
    candidats: Vec<Candidat>,
    vote_infos: HashMap<TerritoireId, VoteInfo>,
    voix: HashMap<(CandidatId, TerritoireId), u64>,
}

impl Election {
    pub fn nouvelle(echeance: Echeance, circonscription: TerritoireId) -> Election {
        Election {
            echeance,
            circonscription,
            candidats: Vec::new(),
            vote_infos: HashMap::new(),
            voix: HashMap::new(),
        }
    }

    pub fn echeance(&self) -> &Echeance {
        &self.echeance
    }

    /// The anchor territory.
    pub fn circonscription(&self) -> TerritoireId {
        self.circonscription
    }

    pub fn ajoute_candidat(&mut self, candidat: Candidat) -> CandidatId {
        let id = CandidatId(self.candidats.len() as u32);
        self.candidats.push(candidat);
        id
    }

    pub fn candidat(&self, id: CandidatId) -> &Candidat {
        &self.candidats[id.0 as usize]
    }

    pub fn candidats(&self) -> impl Iterator<Item = (CandidatId, &Candidat)> {
        self.candidats
            .iter()
            .enumerate()
            .map(|(idx, c)| (CandidatId(idx as u32), c))
    }

    /// Records the turnout, at the anchor when no territory is given.
    pub fn fixe_vote_info(&mut self, vote_info: VoteInfo, territoire: Option<TerritoireId>) {
        let cible = territoire.unwrap_or(self.circonscription);
        self.vote_infos.insert(cible, vote_info);
    }

    /// Records a candidate's vote count, at the anchor when no territory
    /// is given.
    pub fn fixe_voix(&mut self, voix: u64, candidat: CandidatId, territoire: Option<TerritoireId>) {
        let cible = territoire.unwrap_or(self.circonscription);
        self.voix.insert((candidat, cible), voix);
    }

    /// The turnout recorded at the anchor, if any.
    pub fn vote_info(&self) -> Option<&VoteInfo> {
        self.vote_infos.get(&self.circonscription)
    }

    /// Direct score of a candidate at the anchor, its share computed
    /// against the anchor turnout.
    pub fn score_candidat(&self, candidat: CandidatId) -> Score {
        match self.voix.get(&(candidat, self.circonscription)) {
            Some(voix) => {
                let exprimes = self.vote_info().and_then(|vi| vi.exprimes());
                Score::from_voix_et_exprimes(*voix, exprimes)
            }
            None => Score::vide(),
        }
    }

    pub(crate) fn vote_info_sur(&self, territoire: TerritoireId) -> Option<&VoteInfo> {
        self.vote_infos.get(&territoire)
    }

    pub(crate) fn voix_sur(
        &self,
        territoire: TerritoireId,
    ) -> impl Iterator<Item = (CandidatId, u64)> + '_ {
        self.voix
            .iter()
            .filter(move |((_, t), _)| *t == territoire)
            .map(|((c, _), v)| (*c, *v))
    }

    pub(crate) fn voix_de(&self, candidat: CandidatId, territoire: TerritoireId) -> Option<u64> {
        self.voix.get(&(candidat, territoire)).copied()
    }
}
