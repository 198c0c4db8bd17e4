// ********* Territorial hierarchy ***********

use std::error::Error;
use std::fmt::Display;

/// Maximum length of a territory code (the longest convention is the
/// municipal district one, e.g. 056AR01 for the 1st district of Paris).
pub const CODE_MAX: usize = 10;
/// A departement code is at most 4 characters (2A, 2B, 971, ...).
pub const CODE_DEPARTEMENT_MAX: usize = 4;
/// Maximum length of a display name.
pub const NOM_MAX: usize = 255;

/// Opaque handle to a territory in a [Territoires] arena.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub struct TerritoireId(pub(crate) u32);

/// The seven territorial echelons. The set is closed: consolidation
/// dispatches on this tag.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum Echelon {
    Pays,
    Region,
    Departement,
    Commune,
    ArrondissementCommunal,
    CirconscriptionLegislative,
    CirconscriptionEuropeenne,
}

/// Hierarchy links of one node. Parent assignment happens once, at
/// construction time, and is never reassigned, so no cycle can exist.
#[derive(Eq, PartialEq, Debug, Clone)]
enum Liens {
    Pays {
        regions: Vec<TerritoireId>,
        circonscriptions_europeennes: Vec<TerritoireId>,
    },
    Region {
        pays: TerritoireId,
        circonscription_europeenne: Option<TerritoireId>,
        departements: Vec<TerritoireId>,
    },
    Departement {
        region: TerritoireId,
        communes: Vec<TerritoireId>,
        circonscriptions_legislatives: Vec<TerritoireId>,
    },
    Commune {
        departement: TerritoireId,
        arrondissements: Vec<TerritoireId>,
    },
    ArrondissementCommunal {
        commune: TerritoireId,
    },
    CirconscriptionLegislative {
        departement: TerritoireId,
    },
    CirconscriptionEuropeenne {
        pays: TerritoireId,
        regions: Vec<TerritoireId>,
    },
}

/// A territory node: a code (unique under its parent by convention), a
/// display name and its hierarchy links.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Territoire {
    code: String,
    nom: String,
    liens: Liens,
}

impl Territoire {
    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn nom(&self) -> &str {
        &self.nom
    }

    pub fn echelon(&self) -> Echelon {
        match self.liens {
            Liens::Pays { .. } => Echelon::Pays,
            Liens::Region { .. } => Echelon::Region,
            Liens::Departement { .. } => Echelon::Departement,
            Liens::Commune { .. } => Echelon::Commune,
            Liens::ArrondissementCommunal { .. } => Echelon::ArrondissementCommunal,
            Liens::CirconscriptionLegislative { .. } => Echelon::CirconscriptionLegislative,
            Liens::CirconscriptionEuropeenne { .. } => Echelon::CirconscriptionEuropeenne,
        }
    }
}

/// Construction-time bounds violation on a code or a name.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ErreurValidation {
    message: String,
}

impl ErreurValidation {
    fn nouvelle(message: String) -> ErreurValidation {
        ErreurValidation { message }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Error for ErreurValidation {}

impl Display for ErreurValidation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "validation: {}", self.message)
    }
}

fn valide_code(code: &str, max: usize) -> Result<(), ErreurValidation> {
    if code.is_empty() || code.chars().count() > max {
        return Err(ErreurValidation::nouvelle(format!(
            "le code '{}' doit compter entre 1 et {} caracteres",
            code, max
        )));
    }
    Ok(())
}

fn valide_nom(nom: &str) -> Result<(), ErreurValidation> {
    if nom.chars().count() > NOM_MAX {
        return Err(ErreurValidation::nouvelle(format!(
            "le nom ne peut depasser {} caracteres",
            NOM_MAX
        )));
    }
    Ok(())
}

/// Arena holding the whole territorial hierarchy, rooted at a single
/// country node created by [Territoires::nouveau].
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Territoires {
    territoires: Vec<Territoire>,
    pays: TerritoireId,
}

impl Territoires {
    pub fn nouveau(nom_pays: &str) -> Result<Territoires, ErreurValidation> {
        valide_nom(nom_pays)?;
        let pays = Territoire {
            code: "PAYS".to_string(),
            nom: nom_pays.to_string(),
            liens: Liens::Pays {
                regions: Vec::new(),
                circonscriptions_europeennes: Vec::new(),
            },
        };
        Ok(Territoires {
            territoires: vec![pays],
            pays: TerritoireId(0),
        })
    }

    pub fn pays(&self) -> TerritoireId {
        self.pays
    }

    pub fn territoire(&self, id: TerritoireId) -> &Territoire {
        &self.territoires[id.0 as usize]
    }

    pub fn echelon(&self, id: TerritoireId) -> Echelon {
        self.territoire(id).echelon()
    }

    fn insere(&mut self, territoire: Territoire) -> TerritoireId {
        let id = TerritoireId(self.territoires.len() as u32);
        self.territoires.push(territoire);
        id
    }

    fn liens(&self, id: TerritoireId) -> &Liens {
        &self.territoires[id.0 as usize].liens
    }

    fn attend(&self, id: TerritoireId, attendu: Echelon) -> Result<(), ErreurValidation> {
        let trouve = self.echelon(id);
        if trouve != attendu {
            return Err(ErreurValidation::nouvelle(format!(
                "echelon {:?} attendu, {:?} fourni",
                attendu, trouve
            )));
        }
        Ok(())
    }

    pub fn ajoute_region(&mut self, code: &str, nom: &str) -> Result<TerritoireId, ErreurValidation> {
        valide_code(code, CODE_MAX)?;
        valide_nom(nom)?;
        let pays = self.pays;
        let id = self.insere(Territoire {
            code: code.to_string(),
            nom: nom.to_string(),
            liens: Liens::Region {
                pays,
                circonscription_europeenne: None,
                departements: Vec::new(),
            },
        });
        if let Liens::Pays { regions, .. } = &mut self.territoires[pays.0 as usize].liens {
            regions.push(id);
        }
        Ok(id)
    }

    pub fn ajoute_departement(
        &mut self,
        region: TerritoireId,
        code: &str,
        nom: &str,
    ) -> Result<TerritoireId, ErreurValidation> {
        self.attend(region, Echelon::Region)?;
        valide_code(code, CODE_DEPARTEMENT_MAX)?;
        valide_nom(nom)?;
        let id = self.insere(Territoire {
            code: code.to_string(),
            nom: nom.to_string(),
            liens: Liens::Departement {
                region,
                communes: Vec::new(),
                circonscriptions_legislatives: Vec::new(),
            },
        });
        if let Liens::Region { departements, .. } = &mut self.territoires[region.0 as usize].liens {
            departements.push(id);
        }
        Ok(id)
    }

    pub fn ajoute_commune(
        &mut self,
        departement: TerritoireId,
        code: &str,
        nom: &str,
    ) -> Result<TerritoireId, ErreurValidation> {
        self.attend(departement, Echelon::Departement)?;
        valide_code(code, CODE_MAX)?;
        valide_nom(nom)?;
        let id = self.insere(Territoire {
            code: code.to_string(),
            nom: nom.to_string(),
            liens: Liens::Commune {
                departement,
                arrondissements: Vec::new(),
            },
        });
        if let Liens::Departement { communes, .. } =
            &mut self.territoires[departement.0 as usize].liens
        {
            communes.push(id);
        }
        Ok(id)
    }

    pub fn ajoute_arrondissement(
        &mut self,
        commune: TerritoireId,
        code: &str,
        nom: &str,
    ) -> Result<TerritoireId, ErreurValidation> {
        self.attend(commune, Echelon::Commune)?;
        valide_code(code, CODE_MAX)?;
        valide_nom(nom)?;
        let id = self.insere(Territoire {
            code: code.to_string(),
            nom: nom.to_string(),
            liens: Liens::ArrondissementCommunal { commune },
        });
        if let Liens::Commune { arrondissements, .. } =
            &mut self.territoires[commune.0 as usize].liens
        {
            arrondissements.push(id);
        }
        Ok(id)
    }

    /// The display name of a legislative constituency is derived from its
    /// code and its departement.
    pub fn ajoute_circonscription_legislative(
        &mut self,
        departement: TerritoireId,
        code: u32,
    ) -> Result<TerritoireId, ErreurValidation> {
        self.attend(departement, Echelon::Departement)?;
        let nom = format!(
            "Circonscription {} - {}",
            code,
            self.territoire(departement).nom()
        );
        let id = self.insere(Territoire {
            code: code.to_string(),
            nom,
            liens: Liens::CirconscriptionLegislative { departement },
        });
        if let Liens::Departement {
            circonscriptions_legislatives,
            ..
        } = &mut self.territoires[departement.0 as usize].liens
        {
            circonscriptions_legislatives.push(id);
        }
        Ok(id)
    }

    pub fn ajoute_circonscription_europeenne(
        &mut self,
        code: &str,
        nom: &str,
    ) -> Result<TerritoireId, ErreurValidation> {
        valide_code(code, CODE_MAX)?;
        valide_nom(nom)?;
        let pays = self.pays;
        let id = self.insere(Territoire {
            code: code.to_string(),
            nom: nom.to_string(),
            liens: Liens::CirconscriptionEuropeenne {
                pays,
                regions: Vec::new(),
            },
        });
        if let Liens::Pays {
            circonscriptions_europeennes,
            ..
        } = &mut self.territoires[pays.0 as usize].liens
        {
            circonscriptions_europeennes.push(id);
        }
        Ok(id)
    }

    /// Attaches a region to a European constituency. Membership is kept
    /// consistent on both sides; a region belongs to at most one
    /// constituency.
    pub fn rattache_region(
        &mut self,
        circonscription: TerritoireId,
        region: TerritoireId,
    ) -> Result<(), ErreurValidation> {
        self.attend(circonscription, Echelon::CirconscriptionEuropeenne)?;
        self.attend(region, Echelon::Region)?;
        let ancienne = match &mut self.territoires[region.0 as usize].liens {
            Liens::Region {
                circonscription_europeenne,
                ..
            } => circonscription_europeenne.replace(circonscription),
            _ => None,
        };
        if let Some(ancienne) = ancienne {
            if ancienne != circonscription {
                if let Liens::CirconscriptionEuropeenne { regions, .. } =
                    &mut self.territoires[ancienne.0 as usize].liens
                {
                    regions.retain(|r| *r != region);
                }
            }
        }
        if let Liens::CirconscriptionEuropeenne { regions, .. } =
            &mut self.territoires[circonscription.0 as usize].liens
        {
            if !regions.contains(&region) {
                regions.push(region);
            }
        }
        Ok(())
    }

    /// Ordered ancestor chain, the territory itself first, following the
    /// fixed type ladder: arrondissement -> commune -> departement ->
    /// region -> (circonscription europeenne if attached) -> pays. A
    /// legislative constituency joins the ladder at its departement; a
    /// European constituency goes straight to the country.
    pub fn parents(&self, id: TerritoireId) -> Vec<TerritoireId> {
        let mut chaine = vec![id];
        if let Liens::ArrondissementCommunal { commune } = self.liens(*chaine.last().unwrap()) {
            chaine.push(*commune);
        }
        if let Liens::CirconscriptionLegislative { departement } =
            self.liens(*chaine.last().unwrap())
        {
            chaine.push(*departement);
        }
        if let Liens::Commune { departement, .. } = self.liens(*chaine.last().unwrap()) {
            chaine.push(*departement);
        }
        if let Liens::Departement { region, .. } = self.liens(*chaine.last().unwrap()) {
            chaine.push(*region);
        }
        if let Liens::Region {
            pays,
            circonscription_europeenne,
            ..
        } = self.liens(*chaine.last().unwrap())
        {
            if let Some(circonscription) = circonscription_europeenne {
                chaine.push(*circonscription);
            }
            chaine.push(*pays);
        }
        if let Liens::CirconscriptionEuropeenne { pays, .. } = self.liens(*chaine.last().unwrap())
        {
            chaine.push(*pays);
        }
        chaine
    }

    pub fn regions_du_pays(&self) -> &[TerritoireId] {
        match self.liens(self.pays) {
            Liens::Pays { regions, .. } => regions,
            _ => unreachable!(),
        }
    }

    pub fn circonscriptions_europeennes(&self) -> &[TerritoireId] {
        match self.liens(self.pays) {
            Liens::Pays {
                circonscriptions_europeennes,
                ..
            } => circonscriptions_europeennes,
            _ => unreachable!(),
        }
    }

    pub fn departements_de(&self, region: TerritoireId) -> &[TerritoireId] {
        match self.liens(region) {
            Liens::Region { departements, .. } => departements,
            _ => &[],
        }
    }

    pub fn communes_de(&self, departement: TerritoireId) -> &[TerritoireId] {
        match self.liens(departement) {
            Liens::Departement { communes, .. } => communes,
            _ => &[],
        }
    }

    pub fn regions_de(&self, circonscription: TerritoireId) -> &[TerritoireId] {
        match self.liens(circonscription) {
            Liens::CirconscriptionEuropeenne { regions, .. } => regions,
            _ => &[],
        }
    }

    /// Looks a node up by echelon and code. Linear over the arena; the
    /// hierarchy is small and this is only used by loaders.
    pub fn cherche(&self, echelon: Echelon, code: &str) -> Option<TerritoireId> {
        self.territoires
            .iter()
            .enumerate()
            .find(|(_, t)| t.echelon() == echelon && t.code == code)
            .map(|(idx, _)| TerritoireId(idx as u32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn carte() -> Territoires {
        Territoires::nouveau("France").unwrap()
    }

    #[test]
    fn code_departement_est_au_plus_4() {
        let mut carte = carte();
        let region = carte.ajoute_region("11", "Île-de-France").unwrap();
        let res = carte.ajoute_departement(region, "ZEEEE", "Hauts-de-Seine");
        assert!(res.is_err());
    }

    #[test]
    fn a_region_code_et_nom() {
        let mut carte = carte();
        let region = carte.ajoute_region("11", "Île-de-France").unwrap();
        let departement = carte
            .ajoute_departement(region, "92", "Hauts-de-Seine")
            .unwrap();

        assert_eq!("92", carte.territoire(departement).code());
        assert_eq!("Hauts-de-Seine", carte.territoire(departement).nom());
        assert_eq!(Echelon::Departement, carte.echelon(departement));
        assert!(carte.departements_de(region).contains(&departement));
    }

    #[test]
    fn nom_est_au_plus_255() {
        let mut carte = carte();
        let region = carte.ajoute_region("11", "Île-de-France").unwrap();
        let long = "a".repeat(256);
        assert!(carte.ajoute_departement(region, "92", &long).is_err());
        assert!(carte.ajoute_region("12", &long).is_err());
    }

    #[test]
    fn chaine_depuis_la_commune() {
        let mut carte = carte();
        let region = carte.ajoute_region("11", "Île-de-France").unwrap();
        let circo = carte
            .ajoute_circonscription_europeenne("1", "Île-de-France")
            .unwrap();
        carte.rattache_region(circo, region).unwrap();
        let departement = carte
            .ajoute_departement(region, "92", "Hauts-de-Seine")
            .unwrap();
        let commune = carte
            .ajoute_commune(departement, "250", "Bourg-la-Reine")
            .unwrap();

        assert_eq!(
            vec![commune, departement, region, circo, carte.pays()],
            carte.parents(commune)
        );
    }

    #[test]
    fn chaine_sans_circonscription_europeenne() {
        let mut carte = carte();
        let region = carte.ajoute_region("11", "Île-de-France").unwrap();
        assert_eq!(vec![region, carte.pays()], carte.parents(region));
    }

    #[test]
    fn chaine_depuis_arrondissement_et_circonscription() {
        let mut carte = carte();
        let region = carte.ajoute_region("93", "Provence-Alpes-Côte d'Azur").unwrap();
        let departement = carte
            .ajoute_departement(region, "13", "Bouches-du-Rhône")
            .unwrap();
        let commune = carte.ajoute_commune(departement, "055", "Marseille").unwrap();
        let secteur = carte
            .ajoute_arrondissement(commune, "055SR01", "Marseille 1er secteur")
            .unwrap();
        let legislative = carte
            .ajoute_circonscription_legislative(departement, 1)
            .unwrap();

        assert_eq!(
            vec![secteur, commune, departement, region, carte.pays()],
            carte.parents(secteur)
        );
        assert_eq!(
            vec![legislative, departement, region, carte.pays()],
            carte.parents(legislative)
        );
        assert_eq!(
            "Circonscription 1 - Bouches-du-Rhône",
            carte.territoire(legislative).nom()
        );
    }

    #[test]
    fn rattachement_reste_coherent_des_deux_cotes() {
        let mut carte = carte();
        let region = carte.ajoute_region("11", "Île-de-France").unwrap();
        let circo1 = carte.ajoute_circonscription_europeenne("1", "Nord").unwrap();
        let circo2 = carte.ajoute_circonscription_europeenne("2", "Sud").unwrap();

        carte.rattache_region(circo1, region).unwrap();
        assert!(carte.regions_de(circo1).contains(&region));

        // re-attaching moves the region, it does not duplicate it
        carte.rattache_region(circo2, region).unwrap();
        assert!(!carte.regions_de(circo1).contains(&region));
        assert!(carte.regions_de(circo2).contains(&region));
        assert_eq!(
            vec![region, circo2, carte.pays()],
            carte.parents(region)
        );
    }

    #[test]
    fn echelon_du_parent_est_verifie() {
        let mut carte = carte();
        let region = carte.ajoute_region("11", "Île-de-France").unwrap();
        let pays = carte.pays();
        assert!(carte.ajoute_commune(region, "250", "Bourg-la-Reine").is_err());
        assert!(carte.ajoute_departement(pays, "92", "Hauts-de-Seine").is_err());
        assert!(carte.rattache_region(region, region).is_err());
    }
}
