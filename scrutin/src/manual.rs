/*!

This is the long-form manual for `scrutin` and `datelec`.

## Data model

Results are organized around three families of objects:

* the territorial hierarchy ([crate::Territoires]): one country, its regions,
  departements, communes and municipal districts, plus the legislative and
  European constituencies. Nodes are created once, attached to their parent at
  construction, and addressed through [crate::TerritoireId] handles.
* echeances ([crate::Echeance]): a polling date plus a category
  (`cantonales`, `europeennes`, ...). At most one echeance record may exist
  per (date, category).
* elections ([crate::Election]): one recorded contest, anchored to exactly one
  (echeance, territoire) pair, holding its candidates, its turnout and its
  per-candidate vote counts. Figures default to the anchor but can be entered
  per sub-territory when the results exist at a finer granularity
  (`fixe_vote_info(vi, Some(departement))`).

All mutations are staged on an [crate::ElectionRepository] and only become
visible to queries after [crate::ElectionRepository::sauvegarde], which
rejects, as a whole, any commit breaking a uniqueness rule.

## Queries

The two queries are [crate::ElectionRepository::score] and
[crate::ElectionRepository::vote_info] (with `_ensemble` variants folding over
a collection of territories). Both answer for any territory, whether or not a
figure was stored at that exact echelon: a region with no row of its own is
consolidated from its departements, and from the communes of the departements
that have no row either, so that no commune is ever counted twice. European
constituencies consolidate through their member regions, the country through
its European constituencies.

A score is the pair (vote count, share of valid ballots). The share always
uses the valid-ballot count (`exprimes`) of the same territory as denominator.
A query that reaches no stored row returns an explicitly empty value:
`to_voix()` and `to_pourcentage()` are both absent, which is different from a
candidate with zero votes.

```
use chrono::NaiveDate;
use scrutin::*;

let mut territoires = Territoires::nouveau("France")?;
let region = territoires.ajoute_region("11", "Île-de-France")?;

let echeance = Echeance::nouvelle(
    NaiveDate::from_ymd_opt(2015, 3, 22).unwrap(),
    CategorieEcheance::Cantonales,
);
let mut election = Election::nouvelle(echeance.clone(), region);
let candidat = election.ajoute_candidat(Candidat::nouveau("FG", "Naël", "Ferret"));
election.fixe_vote_info(VoteInfo::nouveau(1000, 900, 800), None);
election.fixe_voix(400, candidat, None);

let mut repository = ElectionRepository::nouveau();
let id = repository.ajoute(election);
repository.sauvegarde()?;

let score = repository.score(
    &territoires,
    &echeance,
    region,
    &SelectionCandidats::Unique(id, candidat),
);
assert_eq!(Some(400), score.to_voix());
# Ok::<(), Box<dyn std::error::Error>>(())
```

## Caching

Turnout resolutions are cached per (echeance, territoire) on the repository
instance. The cache is dropped on every successful commit, because a commit
may have changed the facts a cached figure was derived from. Repositories are
meant to be owned by one logical session; share one across threads behind a
lock if you must.

*/
