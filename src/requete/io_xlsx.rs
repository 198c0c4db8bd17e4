use crate::requete::*;

use calamine::{open_workbook, Reader, Xlsx};

/// One commune row parsed from an Excel result sheet, before resolution
/// against the hierarchy.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ResultatCommune {
    pub code: String,
    pub inscrits: Option<u64>,
    pub votants: Option<u64>,
    pub exprimes: Option<u64>,
    /// (candidate family name, vote count) pairs, in header order.
    pub voix: Vec<(String, u64)>,
}

/// Reads per-commune result rows from an Excel sheet. The expected layout
/// is one header row then one row per commune:
/// code | nom | inscrits | votants | exprimes | one column per candidate.
/// The candidate columns carry the candidates' family names in the header.
pub fn read_excel_file(path: String, source: &SourceData) -> DatelecResult<Vec<ResultatCommune>> {
    let p = path.clone();
    let mut workbook: Xlsx<_> =
        open_workbook(p).context(OpeningExcelSnafu { path: path.clone() })?;
    let wrange = match &source.worksheet_name {
        Some(name) => workbook.worksheet_range(name),
        None => workbook.worksheet_range_at(0),
    }
    .context(EmptyExcelSnafu {})?
    .context(OpeningExcelSnafu { path })?;

    let header = wrange.rows().next().context(EmptyExcelSnafu {})?;
    debug!("header: {:?}", header);
    if header.len() < 5 {
        whatever!("result sheet needs at least the code, nom, inscrits, votants and exprimes columns");
    }
    let mut candidats: Vec<String> = Vec::new();
    for cell in &header[5..] {
        match cell {
            calamine::DataType::String(s) if !s.is_empty() => candidats.push(s.clone()),
            _ => {
                whatever!("candidate header cell is not a name: {:?}", cell)
            }
        }
    }

    let mut iter = wrange.rows();
    iter.next();
    let mut res: Vec<ResultatCommune> = Vec::new();
    for row in iter {
        debug!("workbook: {:?}", row);
        let code = read_code(&row[0])?;
        let mut voix: Vec<(String, u64)> = Vec::new();
        for (idx, nom) in candidats.iter().enumerate() {
            if let Some(nombre) = read_count(&row[5 + idx])? {
                voix.push((nom.clone(), nombre));
            }
        }
        res.push(ResultatCommune {
            code,
            inscrits: read_count(&row[2])?,
            votants: read_count(&row[3])?,
            exprimes: read_count(&row[4])?,
            voix,
        });
    }
    Ok(res)
}

fn read_code(cell: &calamine::DataType) -> DatelecResult<String> {
    match cell {
        calamine::DataType::String(s) => Ok(s.clone()),
        calamine::DataType::Float(f) => Ok(format!("{}", *f as u64)),
        calamine::DataType::Int(i) => Ok(i.to_string()),
        _ => whatever!("read_code: could not understand cell {:?}", cell),
    }
}

fn read_count(cell: &calamine::DataType) -> DatelecResult<Option<u64>> {
    match cell {
        calamine::DataType::Float(f) => Ok(Some(*f as u64)),
        calamine::DataType::Int(i) => Ok(Some(*i as u64)),
        calamine::DataType::String(s) if s.is_empty() => Ok(None),
        calamine::DataType::String(s) => match s.parse::<u64>() {
            Ok(x) => Ok(Some(x)),
            Err(_) => whatever!("read_count: not a count: {:?}", s),
        },
        calamine::DataType::Empty => Ok(None),
        _ => whatever!("read_count: could not understand cell {:?}", cell),
    }
}
