// ============================================================
// Layer 4 - ERA5 Profile Loader
// ============================================================
// Loads per-site ERA5 profile files with the netcdf3 crate.
//
// File layout (one file per site and variable):
//
//   {data_dir}/era5hr/climatology/
//     BNF-t-19800101-20241231.nc   ← valid_time, pressures, t(time, level)
//     BNF-w-19800101-20241231.nc   ← w(time, level)
//     BNF-q-19800101-20241231.nc   ← q(time, level)
//
// The time and pressure axes are taken from the temperature
// file; the other two files only contribute their 2-D grid.
//
// netCDF classic files store byte/short/int/float/double.
// Everything is widened to floating point, and packed
// variables (scale_factor / add_offset) are unpacked.

use anyhow::{anyhow, Context, Result};
use netcdf3::{DataVector, FileReader};
use std::path::{Path, PathBuf};

use crate::domain::profile::{ProfileSeries, SiteProfiles};
use crate::domain::traits::ProfileSource;

/// Default period suffix of the climatology files
pub const DEFAULT_PERIOD: &str = "19800101-20241231";

const TIME_VAR:     &str = "valid_time";
const PRESSURE_VAR: &str = "pressures";

/// Reads site profiles from a directory tree of netCDF files.
/// Implements the ProfileSource trait from Layer 3.
pub struct Era5Loader {
    /// Root data directory (the folder holding `era5hr/`)
    data_dir: PathBuf,

    /// Period suffix in the file names, e.g. "19800101-20241231"
    period: String,
}

impl Era5Loader {
    pub fn new(data_dir: impl Into<PathBuf>, period: impl Into<String>) -> Self {
        Self { data_dir: data_dir.into(), period: period.into() }
    }

    /// Folder holding the per-site climatology files
    pub fn climatology_dir(&self) -> PathBuf {
        self.data_dir.join("era5hr").join("climatology")
    }

    /// Path of the file holding `variable` for `geo_id`.
    pub fn file_path(&self, geo_id: &str, variable: &str) -> PathBuf {
        self.climatology_dir()
            .join(format!("{geo_id}-{variable}-{}.nc", self.period))
    }

    fn open(&self, geo_id: &str, variable: &str) -> Result<(PathBuf, FileReader)> {
        let path = self.file_path(geo_id, variable);
        if !path.exists() {
            anyhow::bail!("Profile file '{}' does not exist", path.display());
        }
        let reader = FileReader::open(&path)
            .map_err(|e| anyhow!("Cannot open netCDF file '{}': {:?}", path.display(), e))?;
        Ok((path, reader))
    }
}

impl ProfileSource for Era5Loader {
    fn load_site(&self, geo_id: &str) -> Result<SiteProfiles> {
        tracing::info!("Loading ERA5 profiles for site '{}'", geo_id);

        // ── Temperature file carries the axes ────────────────────────────────
        let (t_path, mut reader) = self.open(geo_id, "t")?;
        let times     = read_numeric(&mut reader, &t_path, TIME_VAR)?;
        let pressures = read_numeric(&mut reader, &t_path, PRESSURE_VAR)?;
        let temperature = read_grid(&mut reader, &t_path, "t", times.len(), pressures.len())?;
        drop(reader);

        let vertical_velocity = self.load_grid(geo_id, "w", times.len(), pressures.len())?;
        let humidity          = self.load_grid(geo_id, "q", times.len(), pressures.len())?;

        tracing::info!(
            "Loaded site '{}': {} time steps x {} levels",
            geo_id,
            times.len(),
            pressures.len(),
        );

        SiteProfiles::new(geo_id, times, pressures, temperature, humidity, vertical_velocity)
    }
}

impl Era5Loader {
    fn load_grid(
        &self,
        geo_id:   &str,
        variable: &str,
        n_time:   usize,
        n_level:  usize,
    ) -> Result<ProfileSeries> {
        let (path, mut reader) = self.open(geo_id, variable)?;
        read_grid(&mut reader, &path, variable, n_time, n_level)
    }
}

/// Read a 2-D (time, level) variable and wrap it as a ProfileSeries.
fn read_grid(
    reader:   &mut FileReader,
    path:     &Path,
    variable: &str,
    n_time:   usize,
    n_level:  usize,
) -> Result<ProfileSeries> {
    let values: Vec<f32> = read_numeric(reader, path, variable)?
        .into_iter()
        .map(|v| v as f32)
        .collect();
    ProfileSeries::new(variable, values, n_time, n_level)
        .with_context(|| format!("Unexpected grid shape in '{}'", path.display()))
}

/// Read any numeric variable as f64, unpacking scale_factor / add_offset.
fn read_numeric(reader: &mut FileReader, path: &Path, variable: &str) -> Result<Vec<f64>> {
    let data_set = reader.data_set();
    if data_set.get_var(variable).is_none() {
        anyhow::bail!("Variable '{}' not found in '{}'", variable, path.display());
    }
    let scale  = packing_attr(reader, variable, "scale_factor");
    let offset = packing_attr(reader, variable, "add_offset");

    let raw = reader
        .read_var(variable)
        .map_err(|e| anyhow!("Cannot read '{}' from '{}': {:?}", variable, path.display(), e))?;

    let mut values = widen(raw);
    if scale.is_some() || offset.is_some() {
        let scale  = scale.unwrap_or(1.0);
        let offset = offset.unwrap_or(0.0);
        tracing::debug!("Unpacking '{}' with scale={} offset={}", variable, scale, offset);
        for v in values.iter_mut() {
            *v = *v * scale + offset;
        }
    }
    Ok(values)
}

/// First value of a float/double attribute on `variable`, if present.
fn packing_attr(reader: &FileReader, variable: &str, attr: &str) -> Option<f64> {
    let data_set = reader.data_set();
    if let Some(v) = data_set.get_var_attr_f64(variable, attr) {
        return v.first().copied();
    }
    data_set
        .get_var_attr_f32(variable, attr)
        .and_then(|v| v.first().map(|&x| x as f64))
}

/// Widen every netCDF classic data type to f64.
fn widen(data: DataVector) -> Vec<f64> {
    match data {
        DataVector::I8(v)  => v.into_iter().map(f64::from).collect(),
        DataVector::U8(v)  => v.into_iter().map(f64::from).collect(),
        DataVector::I16(v) => v.into_iter().map(f64::from).collect(),
        DataVector::I32(v) => v.into_iter().map(f64::from).collect(),
        DataVector::F32(v) => v.into_iter().map(f64::from).collect(),
        DataVector::F64(v) => v,
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use netcdf3::{DataSet, FileWriter, Version};

    /// Write one classic netCDF file in the ERA5 site layout.
    /// The `t` file also carries the time and pressure axes.
    pub(crate) fn write_site_file(
        loader:    &Era5Loader,
        geo_id:    &str,
        variable:  &str,
        times:     &[f64],
        pressures: &[f32],
        values:    &[f32],
    ) {
        std::fs::create_dir_all(loader.climatology_dir()).unwrap();
        let mut ds = DataSet::new();
        ds.add_fixed_dim("valid_time", times.len()).unwrap();
        ds.add_fixed_dim("pressure", pressures.len()).unwrap();
        ds.add_var_f64("valid_time", &["valid_time"]).unwrap();
        ds.add_var_f32("pressures", &["pressure"]).unwrap();
        ds.add_var_f32(variable, &["valid_time", "pressure"]).unwrap();

        let mut writer = FileWriter::open(loader.file_path(geo_id, variable)).unwrap();
        writer.set_def(&ds, Version::Classic, 0).unwrap();
        writer.write_var_f64("valid_time", times).unwrap();
        writer.write_var_f32("pressures", pressures).unwrap();
        writer.write_var_f32(variable, values).unwrap();
        writer.close().unwrap();
    }

    /// Write a full t/w/q site with simple deterministic patterns.
    pub(crate) fn write_site(loader: &Era5Loader, geo_id: &str, n_time: usize) {
        let times: Vec<f64>     = (0..n_time).map(|i| i as f64).collect();
        let pressures: Vec<f32> = vec![1000.0, 850.0, 500.0];
        let n = n_time * pressures.len();
        let t: Vec<f32> = (0..n).map(|k| 250.0 + (k % 3) as f32 * 10.0 + (k as f32 * 0.7).sin()).collect();
        let q: Vec<f32> = (0..n).map(|k| 0.01 + (k as f32 * 0.3).cos() * 0.001).collect();
        let w: Vec<f32> = (0..n).map(|k| (k as f32 * 0.5).sin() * 0.2).collect();
        write_site_file(loader, geo_id, "t", &times, &pressures, &t);
        write_site_file(loader, geo_id, "w", &times, &pressures, &w);
        write_site_file(loader, geo_id, "q", &times, &pressures, &q);
    }

    #[test]
    fn test_file_naming_convention() {
        let loader = Era5Loader::new("/data", DEFAULT_PERIOD);
        assert_eq!(
            loader.file_path("BNF", "w"),
            PathBuf::from("/data/era5hr/climatology/BNF-w-19800101-20241231.nc"),
        );
    }

    #[test]
    fn test_load_site_reads_all_variables() {
        let dir    = tempfile::tempdir().unwrap();
        let loader = Era5Loader::new(dir.path(), DEFAULT_PERIOD);
        write_site(&loader, "BNF", 6);

        let site = loader.load_site("BNF").unwrap();
        assert_eq!(site.n_time(), 6);
        assert_eq!(site.pressures, vec![1000.0, 850.0, 500.0]);
        assert_eq!(site.vertical_velocity.values.len(), 18);
        assert!((site.temperature.row(0)[1] - (260.0 + 0.7f32.sin())).abs() < 1e-3);
    }

    #[test]
    fn test_missing_file_names_the_path() {
        let dir    = tempfile::tempdir().unwrap();
        let loader = Era5Loader::new(dir.path(), DEFAULT_PERIOD);
        let err    = loader.load_site("XYZ").unwrap_err().to_string();
        assert!(err.contains("XYZ-t-19800101-20241231.nc"), "{err}");
    }

    #[test]
    fn test_packed_variable_is_unpacked() {
        let dir    = tempfile::tempdir().unwrap();
        let loader = Era5Loader::new(dir.path(), "2000");
        std::fs::create_dir_all(loader.climatology_dir()).unwrap();

        let mut ds = DataSet::new();
        ds.add_fixed_dim("valid_time", 2).unwrap();
        ds.add_var_i16("packed", &["valid_time"]).unwrap();
        ds.add_var_attr_f64("packed", "scale_factor", vec![0.5]).unwrap();
        ds.add_var_attr_f64("packed", "add_offset", vec![100.0]).unwrap();

        let path = loader.file_path("BNF", "x");
        let mut writer = FileWriter::open(&path).unwrap();
        writer.set_def(&ds, Version::Classic, 0).unwrap();
        writer.write_var_i16("packed", &[2, -4]).unwrap();
        writer.close().unwrap();

        let mut reader = FileReader::open(&path).unwrap();
        let values = read_numeric(&mut reader, &path, "packed").unwrap();
        assert_eq!(values, vec![101.0, 98.0]);
    }

    #[test]
    fn test_every_classic_type_is_widened() {
        assert_eq!(widen(DataVector::I8(vec![-3, 7])),     vec![-3.0, 7.0]);
        assert_eq!(widen(DataVector::U8(vec![0, 255])),    vec![0.0, 255.0]);
        assert_eq!(widen(DataVector::I32(vec![-70_000])),  vec![-70_000.0]);
        assert_eq!(widen(DataVector::F64(vec![0.125])),    vec![0.125]);
    }

    #[test]
    fn test_float_scale_factor_is_applied() {
        let dir    = tempfile::tempdir().unwrap();
        let loader = Era5Loader::new(dir.path(), "2000");
        std::fs::create_dir_all(loader.climatology_dir()).unwrap();

        let mut ds = DataSet::new();
        ds.add_fixed_dim("valid_time", 2).unwrap();
        ds.add_var_i32("packed", &["valid_time"]).unwrap();
        ds.add_var_attr_f32("packed", "scale_factor", vec![0.25]).unwrap();

        let path = loader.file_path("BNF", "x");
        let mut writer = FileWriter::open(&path).unwrap();
        writer.set_def(&ds, Version::Classic, 0).unwrap();
        writer.write_var_i32("packed", &[4, -8]).unwrap();
        writer.close().unwrap();

        let mut reader = FileReader::open(&path).unwrap();
        let values = read_numeric(&mut reader, &path, "packed").unwrap();
        assert_eq!(values, vec![1.0, -2.0]);
    }
}
