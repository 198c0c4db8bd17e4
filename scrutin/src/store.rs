// ********* Election store: staging, commit, uniqueness ***********

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::error::Error;
use std::fmt::Display;

use log::{debug, info};

use crate::election::{CategorieEcheance, Echeance, Election, VoteInfo};
use crate::territoire::{TerritoireId, Territoires};

/// Handle to an election held by an [ElectionRepository].
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub struct ElectionId(pub(crate) u32);

/// A commit was rejected because it would break a uniqueness rule. The
/// staged changes are left staged: the caller may drop the offending
/// object and retry the commit.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum ConflitUnicite {
    /// Two elections would share the same (echeance, territoire) anchor.
    Election {
        echeance: Echeance,
        circonscription: TerritoireId,
    },
    /// Two echeance records would share the same (date, categorie).
    Echeance { echeance: Echeance },
}

impl Error for ConflitUnicite {}

impl Display for ConflitUnicite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConflitUnicite::Election {
                echeance,
                circonscription,
            } => write!(
                f,
                "deux elections pour l'echeance {:?} {} sur le territoire {:?}",
                echeance.categorie(),
                echeance.date(),
                circonscription
            ),
            ConflitUnicite::Echeance { echeance } => write!(
                f,
                "deux echeances {:?} au {}",
                echeance.categorie(),
                echeance.date()
            ),
        }
    }
}

/// In-memory election store. Mutations are staged by [ElectionRepository::ajoute],
/// [ElectionRepository::retire] and the working copies handed out by
/// [ElectionRepository::election_mut]; they only become visible to queries
/// after a successful [ElectionRepository::sauvegarde]. The store also
/// registers echeances, and owns the turnout cache used by the query side
/// (one cache per repository instance, cleared on every commit).
#[derive(Default, Debug)]
pub struct ElectionRepository {
    elections: BTreeMap<ElectionId, Election>,
    echeances: BTreeSet<Echeance>,
    // staged state
    en_attente: BTreeMap<ElectionId, Election>,
    retraits: BTreeSet<ElectionId>,
    echeances_en_attente: Vec<Echeance>,
    retraits_echeances: Vec<Echeance>,
    prochain_id: u32,
    pub(crate) cache_vote_info: HashMap<(Echeance, TerritoireId), VoteInfo>,
}

impl ElectionRepository {
    pub fn nouveau() -> ElectionRepository {
        ElectionRepository::default()
    }

    /// Stages a new election. Nothing is visible to queries before
    /// [ElectionRepository::sauvegarde].
    pub fn ajoute(&mut self, election: Election) -> ElectionId {
        let id = ElectionId(self.prochain_id);
        self.prochain_id += 1;
        self.en_attente.insert(id, election);
        id
    }

    /// Stages the removal of an election. Removing an election that was
    /// staged but never committed simply cancels the staged addition.
    pub fn retire(&mut self, id: ElectionId) {
        self.en_attente.remove(&id);
        if self.elections.contains_key(&id) {
            self.retraits.insert(id);
        }
    }

    /// The current working copy of an election: the staged version when
    /// one exists, the committed one otherwise.
    pub fn election(&self, id: ElectionId) -> Option<&Election> {
        self.en_attente.get(&id).or_else(|| self.elections.get(&id))
    }

    /// Mutable working copy of an election. Mutating a committed election
    /// stages a modified copy; queries keep answering from the committed
    /// version until the next commit.
    pub fn election_mut(&mut self, id: ElectionId) -> Option<&mut Election> {
        if self.retraits.contains(&id) {
            return None;
        }
        if !self.en_attente.contains_key(&id) {
            if let Some(committed) = self.elections.get(&id) {
                self.en_attente.insert(id, committed.clone());
            } else {
                return None;
            }
        }
        self.en_attente.get_mut(&id)
    }

    /// Stages an echeance record. Committing a duplicate of an already
    /// registered echeance is a conflict.
    pub fn ajoute_echeance(&mut self, echeance: Echeance) {
        self.echeances_en_attente.push(echeance);
    }

    pub fn retire_echeance(&mut self, echeance: &Echeance) {
        self.echeances_en_attente.retain(|e| e != echeance);
        if self.echeances.contains(echeance) {
            self.retraits_echeances.push(echeance.clone());
        }
    }

    /// Looks up a committed echeance by (date, categorie).
    pub fn echeance(
        &self,
        date: chrono::NaiveDate,
        categorie: CategorieEcheance,
    ) -> Option<&Echeance> {
        self.echeances
            .iter()
            .find(|e| e.date() == date && e.categorie() == categorie)
    }

    pub fn echeances(&self) -> impl Iterator<Item = &Echeance> {
        self.echeances.iter()
    }

    /// Applies the staged changes atomically. The commit is rejected as a
    /// whole, with every staged change left in place, if it would leave
    /// two elections on the same (echeance, territoire) anchor or two
    /// echeance records on the same (date, categorie). On success the
    /// echeances of the committed elections are registered and the
    /// turnout cache is dropped, since the facts any cached figure was
    /// derived from may have changed.
    pub fn sauvegarde(&mut self) -> Result<(), ConflitUnicite> {
        let mut prospectives = self.elections.clone();
        for id in &self.retraits {
            prospectives.remove(id);
        }
        for (id, election) in &self.en_attente {
            prospectives.insert(*id, election.clone());
        }

        let mut ancres: HashMap<(Echeance, TerritoireId), ElectionId> = HashMap::new();
        for (id, election) in &prospectives {
            let ancre = (election.echeance().clone(), election.circonscription());
            if ancres.insert(ancre, *id).is_some() {
                return Err(ConflitUnicite::Election {
                    echeance: election.echeance().clone(),
                    circonscription: election.circonscription(),
                });
            }
        }

        let mut echeances = self.echeances.clone();
        for echeance in &self.retraits_echeances {
            echeances.remove(echeance);
        }
        for echeance in &self.echeances_en_attente {
            if !echeances.insert(echeance.clone()) {
                return Err(ConflitUnicite::Echeance {
                    echeance: echeance.clone(),
                });
            }
        }
        // every committed election registers its echeance
        for election in prospectives.values() {
            echeances.insert(election.echeance().clone());
        }

        info!(
            "sauvegarde: {} elections, {} echeances",
            prospectives.len(),
            echeances.len()
        );
        self.elections = prospectives;
        self.echeances = echeances;
        self.en_attente.clear();
        self.retraits.clear();
        self.echeances_en_attente.clear();
        self.retraits_echeances.clear();
        self.cache_vote_info.clear();
        Ok(())
    }

    /// Resolves the election covering a territory for an echeance: walks
    /// the self-plus-ancestors chain, nearest first, and returns the
    /// first committed election anchored on a member of the chain.
    pub fn election_couvrant(
        &self,
        territoires: &Territoires,
        echeance: &Echeance,
        territoire: TerritoireId,
    ) -> Option<ElectionId> {
        for membre in territoires.parents(territoire) {
            for (id, election) in &self.elections {
                if election.echeance() == echeance && election.circonscription() == membre {
                    debug!("election_couvrant: {:?} ancree sur {:?}", id, membre);
                    return Some(*id);
                }
            }
        }
        None
    }

    /// Committed elections, in insertion order.
    pub fn elections(&self) -> impl Iterator<Item = (ElectionId, &Election)> {
        self.elections.iter().map(|(id, e)| (*id, e))
    }

    pub(crate) fn election_commise(&self, id: ElectionId) -> Option<&Election> {
        self.elections.get(&id)
    }

    pub(crate) fn elections_pour<'a>(
        &'a self,
        echeance: &'a Echeance,
    ) -> impl Iterator<Item = (ElectionId, &'a Election)> {
        self.elections
            .iter()
            .filter(move |(_, e)| e.echeance() == echeance)
            .map(|(id, e)| (*id, e))
    }
}
