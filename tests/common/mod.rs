//! Shared fixtures: a small synthetic housing dataset packed into zip archives

#![allow(dead_code)]

use std::io::Write;
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

pub const N_ROWS: usize = 60;

/// One generated house, as written to the CSV
pub struct HousingRow {
    pub order: usize,
    pub lot_area: Option<usize>,
    pub gr_liv_area: f64,
    pub overall_qual: usize,
    pub neighborhood: &'static str,
    pub sale_price: f64,
}

pub fn housing_row(i: usize) -> HousingRow {
    let neighborhoods = ["NAmes", "CollgCr", "OldTown"];
    let gr_liv_area = 800.0 + (i as f64) * 33.0;
    let overall_qual = 1 + (i * 3) % 10;
    HousingRow {
        order: i + 1,
        lot_area: (i % 17 != 0).then(|| 5000 + (i * 7919) % 1000 * 10),
        gr_liv_area,
        overall_qual,
        neighborhood: if i == 5 { "" } else { neighborhoods[i % 3] },
        sale_price: 50_000.0
            + 100.0 * gr_liv_area
            + 10_000.0 * overall_qual as f64
            + 2_000.0 * (i as f64).sin(),
    }
}

/// CSV with the columns the pipelines touch, a few nulls included
pub fn housing_csv() -> String {
    let mut csv = String::from("Order,Lot Area,Gr Liv Area,Overall Qual,Neighborhood,SalePrice\n");
    for i in 0..N_ROWS {
        let row = housing_row(i);
        let lot_area = row.lot_area.map(|v| v.to_string()).unwrap_or_default();
        csv.push_str(&format!(
            "{},{},{},{},{},{:.2}\n",
            row.order, lot_area, row.gr_liv_area, row.overall_qual, row.neighborhood, row.sale_price
        ));
    }
    csv
}

/// Write a zip archive holding `entries` of (name, contents)
pub fn write_zip(path: &Path, entries: &[(&str, &str)]) -> PathBuf {
    let file = std::fs::File::create(path).unwrap();
    let mut zip = ZipWriter::new(file);
    for (name, contents) in entries {
        zip.start_file(*name, SimpleFileOptions::default()).unwrap();
        zip.write_all(contents.as_bytes()).unwrap();
    }
    zip.finish().unwrap();
    path.to_path_buf()
}

/// `houses.zip` with a single CSV inside `dir`
pub fn housing_zip(dir: &Path) -> PathBuf {
    let csv = housing_csv();
    write_zip(&dir.join("houses.zip"), &[("AmesHousing.csv", csv.as_str())])
}
