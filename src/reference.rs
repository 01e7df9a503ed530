//! Static administrative reference tables.
//!
//! A single versioned table covers both lookup paths: each department knows
//! its owning region's INSEE code, and each region is keyed by that code.
//! Coordinates are those of the administrative seat (prefecture for a
//! department, regional capital for a region).

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use serde::Serialize;

/// Version of the administrative map encoded below (post-2016 regions).
pub const REFERENCE_VERSION: &str = "2016";

/// Display name used when a code is absent from the tables.
pub const UNKNOWN: &str = "Unknown";

/// A WGS84 point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

const fn at(lat: f64, lon: f64) -> Coordinates {
    Coordinates { lat, lon }
}

/// One department row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Department {
    pub code: &'static str,
    pub name: &'static str,
    pub region_code: &'static str,
    pub seat: Coordinates,
}

/// One region row, keyed by INSEE region code.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Region {
    pub code: &'static str,
    pub name: &'static str,
    pub seat: Coordinates,
}

const fn dep(
    code: &'static str,
    name: &'static str,
    region_code: &'static str,
    seat: Coordinates,
) -> Department {
    Department {
        code,
        name,
        region_code,
        seat,
    }
}

const fn reg(code: &'static str, name: &'static str, seat: Coordinates) -> Region {
    Region { code, name, seat }
}

pub const REGIONS: &[Region] = &[
    reg("01", "Guadeloupe", at(15.9985, -61.7255)),
    reg("02", "Martinique", at(14.6161, -61.0588)),
    reg("03", "Guyane", at(4.9224, -52.3135)),
    reg("04", "La Réunion", at(-20.8821, 55.4507)),
    reg("06", "Mayotte", at(-12.7806, 45.2279)),
    reg("11", "Île-de-France", at(48.8566, 2.3522)),
    reg("24", "Centre-Val de Loire", at(47.9030, 1.9093)),
    reg("27", "Bourgogne-Franche-Comté", at(47.3220, 5.0415)),
    reg("28", "Normandie", at(49.4432, 1.0999)),
    reg("32", "Hauts-de-France", at(50.6292, 3.0573)),
    reg("44", "Grand Est", at(48.5734, 7.7521)),
    reg("52", "Pays de la Loire", at(47.2184, -1.5536)),
    reg("53", "Bretagne", at(48.1173, -1.6778)),
    reg("75", "Nouvelle-Aquitaine", at(44.8378, -0.5792)),
    reg("76", "Occitanie", at(43.6047, 1.4442)),
    reg("84", "Auvergne-Rhône-Alpes", at(45.7640, 4.8357)),
    reg("93", "Provence-Alpes-Côte d'Azur", at(43.2965, 5.3698)),
    reg("94", "Corse", at(41.9192, 8.7386)),
];

pub const DEPARTMENTS: &[Department] = &[
    dep("01", "Ain", "84", at(46.2052, 5.2255)),
    dep("02", "Aisne", "32", at(49.5641, 3.6199)),
    dep("03", "Allier", "84", at(46.5646, 3.3325)),
    dep("04", "Alpes-de-Haute-Provence", "93", at(44.0925, 6.2356)),
    dep("05", "Hautes-Alpes", "93", at(44.5594, 6.0786)),
    dep("06", "Alpes-Maritimes", "93", at(43.7102, 7.2620)),
    dep("07", "Ardèche", "84", at(44.7353, 4.5993)),
    dep("08", "Ardennes", "44", at(49.7621, 4.7263)),
    dep("09", "Ariège", "76", at(42.9653, 1.6071)),
    dep("10", "Aube", "44", at(48.2973, 4.0744)),
    dep("11", "Aude", "76", at(43.2130, 2.3491)),
    dep("12", "Aveyron", "76", at(44.3506, 2.5750)),
    dep("13", "Bouches-du-Rhône", "93", at(43.2965, 5.3698)),
    dep("14", "Calvados", "28", at(49.1829, -0.3707)),
    dep("15", "Cantal", "84", at(44.9264, 2.4398)),
    dep("16", "Charente", "75", at(45.6484, 0.1562)),
    dep("17", "Charente-Maritime", "75", at(46.1603, -1.1511)),
    dep("18", "Cher", "24", at(47.0810, 2.3988)),
    dep("19", "Corrèze", "75", at(45.2658, 1.7722)),
    dep("2A", "Corse-du-Sud", "94", at(41.9192, 8.7386)),
    dep("2B", "Haute-Corse", "94", at(42.6973, 9.4509)),
    dep("21", "Côte-d'Or", "27", at(47.3220, 5.0415)),
    dep("22", "Côtes-d'Armor", "53", at(48.5141, -2.7603)),
    dep("23", "Creuse", "75", at(46.1716, 1.8714)),
    dep("24", "Dordogne", "75", at(45.1847, 0.7214)),
    dep("25", "Doubs", "27", at(47.2378, 6.0241)),
    dep("26", "Drôme", "84", at(44.9334, 4.8924)),
    dep("27", "Eure", "28", at(49.0241, 1.1508)),
    dep("28", "Eure-et-Loir", "24", at(48.4439, 1.4890)),
    dep("29", "Finistère", "53", at(47.9960, -4.1024)),
    dep("30", "Gard", "76", at(43.8367, 4.3601)),
    dep("31", "Haute-Garonne", "76", at(43.6047, 1.4442)),
    dep("32", "Gers", "76", at(43.6465, 0.5855)),
    dep("33", "Gironde", "75", at(44.8378, -0.5792)),
    dep("34", "Hérault", "76", at(43.6108, 3.8767)),
    dep("35", "Ille-et-Vilaine", "53", at(48.1173, -1.6778)),
    dep("36", "Indre", "24", at(46.8103, 1.6913)),
    dep("37", "Indre-et-Loire", "24", at(47.3941, 0.6848)),
    dep("38", "Isère", "84", at(45.1885, 5.7245)),
    dep("39", "Jura", "27", at(46.6747, 5.5550)),
    dep("40", "Landes", "75", at(43.8902, -0.4990)),
    dep("41", "Loir-et-Cher", "24", at(47.5861, 1.3359)),
    dep("42", "Loire", "84", at(45.4397, 4.3872)),
    dep("43", "Haute-Loire", "84", at(45.0434, 3.8855)),
    dep("44", "Loire-Atlantique", "52", at(47.2184, -1.5536)),
    dep("45", "Loiret", "24", at(47.9030, 1.9093)),
    dep("46", "Lot", "76", at(44.4475, 1.4419)),
    dep("47", "Lot-et-Garonne", "75", at(44.2033, 0.6163)),
    dep("48", "Lozère", "76", at(44.5181, 3.5006)),
    dep("49", "Maine-et-Loire", "52", at(47.4784, -0.5632)),
    dep("50", "Manche", "28", at(49.1157, -1.0906)),
    dep("51", "Marne", "44", at(48.9566, 4.3631)),
    dep("52", "Haute-Marne", "44", at(48.1113, 5.1392)),
    dep("53", "Mayenne", "52", at(48.0707, -0.7734)),
    dep("54", "Meurthe-et-Moselle", "44", at(48.6921, 6.1844)),
    dep("55", "Meuse", "44", at(48.7727, 5.1600)),
    dep("56", "Morbihan", "53", at(47.6582, -2.7608)),
    dep("57", "Moselle", "44", at(49.1193, 6.1757)),
    dep("58", "Nièvre", "27", at(46.9910, 3.1590)),
    dep("59", "Nord", "32", at(50.6292, 3.0573)),
    dep("60", "Oise", "32", at(49.4295, 2.0807)),
    dep("61", "Orne", "28", at(48.4329, 0.0913)),
    dep("62", "Pas-de-Calais", "32", at(50.2910, 2.7775)),
    dep("63", "Puy-de-Dôme", "84", at(45.7772, 3.0870)),
    dep("64", "Pyrénées-Atlantiques", "75", at(43.2951, -0.3708)),
    dep("65", "Hautes-Pyrénées", "76", at(43.2328, 0.0781)),
    dep("66", "Pyrénées-Orientales", "76", at(42.6887, 2.8948)),
    dep("67", "Bas-Rhin", "44", at(48.5734, 7.7521)),
    dep("68", "Haut-Rhin", "44", at(48.0794, 7.3585)),
    dep("69", "Rhône", "84", at(45.7640, 4.8357)),
    dep("70", "Haute-Saône", "27", at(47.6223, 6.1557)),
    dep("71", "Saône-et-Loire", "27", at(46.3069, 4.8287)),
    dep("72", "Sarthe", "52", at(48.0061, 0.1996)),
    dep("73", "Savoie", "84", at(45.5646, 5.9178)),
    dep("74", "Haute-Savoie", "84", at(45.8992, 6.1294)),
    dep("75", "Paris", "11", at(48.8566, 2.3522)),
    dep("76", "Seine-Maritime", "28", at(49.4432, 1.0999)),
    dep("77", "Seine-et-Marne", "11", at(48.5421, 2.6554)),
    dep("78", "Yvelines", "11", at(48.8049, 2.1204)),
    dep("79", "Deux-Sèvres", "75", at(46.3237, -0.4588)),
    dep("80", "Somme", "32", at(49.8941, 2.2958)),
    dep("81", "Tarn", "76", at(43.9289, 2.1464)),
    dep("82", "Tarn-et-Garonne", "76", at(44.0176, 1.3550)),
    dep("83", "Var", "93", at(43.1242, 5.9280)),
    dep("84", "Vaucluse", "93", at(43.9493, 4.8055)),
    dep("85", "Vendée", "52", at(46.6705, -1.4260)),
    dep("86", "Vienne", "75", at(46.5802, 0.3404)),
    dep("87", "Haute-Vienne", "75", at(45.8336, 1.2611)),
    dep("88", "Vosges", "44", at(48.1724, 6.4496)),
    dep("89", "Yonne", "27", at(47.7982, 3.5733)),
    dep("90", "Territoire de Belfort", "27", at(47.6380, 6.8628)),
    dep("91", "Essonne", "11", at(48.6290, 2.4410)),
    dep("92", "Hauts-de-Seine", "11", at(48.8924, 2.2069)),
    dep("93", "Seine-Saint-Denis", "11", at(48.9106, 2.4397)),
    dep("94", "Val-de-Marne", "11", at(48.7904, 2.4556)),
    dep("95", "Val-d'Oise", "11", at(49.0364, 2.0761)),
    dep("971", "Guadeloupe", "01", at(15.9985, -61.7255)),
    dep("972", "Martinique", "02", at(14.6161, -61.0588)),
    dep("973", "Guyane", "03", at(4.9224, -52.3135)),
    dep("974", "La Réunion", "04", at(-20.8821, 55.4507)),
    dep("976", "Mayotte", "06", at(-12.7806, 45.2279)),
];

static BUILTIN: Lazy<Arc<ReferenceTables>> =
    Lazy::new(|| Arc::new(ReferenceTables::new(DEPARTMENTS, REGIONS)));

/// Indexed, immutable view over department and region rows.
#[derive(Debug, Clone)]
pub struct ReferenceTables {
    version: &'static str,
    departments: HashMap<&'static str, Department>,
    regions: HashMap<&'static str, Region>,
}

impl ReferenceTables {
    /// Indexes the given rows. Later duplicates of a code replace earlier ones.
    #[must_use]
    pub fn new(departments: &[Department], regions: &[Region]) -> Self {
        Self {
            version: REFERENCE_VERSION,
            departments: departments.iter().map(|d| (d.code, *d)).collect(),
            regions: regions.iter().map(|r| (r.code, *r)).collect(),
        }
    }

    /// Shared instance over the builtin tables.
    #[must_use]
    pub fn builtin() -> Arc<Self> {
        Arc::clone(&BUILTIN)
    }

    #[must_use]
    pub const fn version(&self) -> &'static str {
        self.version
    }

    #[must_use]
    pub fn department(&self, code: &str) -> Option<&Department> {
        self.departments.get(code)
    }

    #[must_use]
    pub fn region(&self, code: &str) -> Option<&Region> {
        self.regions.get(code)
    }

    /// Region owning a department, following the department's region code.
    #[must_use]
    pub fn region_of_department(&self, department_code: &str) -> Option<&Region> {
        self.department(department_code)
            .and_then(|d| self.region(d.region_code))
    }

    #[must_use]
    pub fn is_department(&self, code: &str) -> bool {
        self.departments.contains_key(code)
    }

    #[must_use]
    pub fn is_region(&self, code: &str) -> bool {
        self.regions.contains_key(code)
    }
}

impl Default for ReferenceTables {
    fn default() -> Self {
        Self::new(DEPARTMENTS, REGIONS)
    }
}
