//! Filesystem implementations of the engine's collaborator traits.

use std::fs;
use std::path::{Path, PathBuf};

use cellmask::{
    Destination, Image, NavigationProvider, PersistenceProvider, Raster, ReferenceCounts,
    StaticReferenceCounts,
};
use tracing::{debug, info, warn};

use crate::AnnotatorError;

/// Extensions of the images a directory navigator picks up.
pub const SUPPORTED_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "tif", "tiff", "bmp"];

/// Decodes an image file into a source image named after the file.
pub fn load_image(path: &Path) -> cellmask::Result<Image> {
    let pixels = image::open(path)?.to_rgb8();
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let format = path
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default();
    debug!("Loaded '{}' ({}x{})", name, pixels.width(), pixels.height());
    Ok(Image::new(name, format, Raster::from_rgb(pixels)))
}

fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

/// Walks the supported images of one directory in name order, wrapping at
/// both ends. Images are decoded on every fetch.
#[derive(Debug, Clone)]
pub struct DirectoryNavigator {
    paths: Vec<PathBuf>,
    index: usize,
}

impl DirectoryNavigator {
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self, AnnotatorError> {
        let mut paths = Vec::new();
        for entry in fs::read_dir(dir.as_ref())? {
            let path = entry?.path();
            if path.is_file() && is_supported(&path) {
                paths.push(path);
            }
        }
        paths.sort();

        info!("Found {} images in {:?}", paths.len(), dir.as_ref());
        Ok(Self { paths, index: 0 })
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    fn load(&self) -> cellmask::Result<Option<Image>> {
        self.paths.get(self.index).map(|path| load_image(path)).transpose()
    }
}

impl NavigationProvider for DirectoryNavigator {
    fn current_image(&mut self) -> cellmask::Result<Option<Image>> {
        self.load()
    }

    fn next_image(&mut self) -> cellmask::Result<Option<Image>> {
        if !self.paths.is_empty() {
            self.index = (self.index + 1) % self.paths.len();
        }
        self.load()
    }

    fn previous_image(&mut self) -> cellmask::Result<Option<Image>> {
        if !self.paths.is_empty() {
            self.index = (self.index + self.paths.len() - 1) % self.paths.len();
        }
        self.load()
    }

    fn image_at(&mut self, index: usize) -> cellmask::Result<Option<Image>> {
        if index >= self.paths.len() {
            return Ok(None);
        }
        self.index = index;
        self.load()
    }

    fn image_count(&self) -> usize {
        self.paths.len()
    }

    fn current_index(&self) -> usize {
        self.index
    }
}

/// Reference counts read from a CSV with a header row. Column `x` holds the
/// image name without extension and column `y` the expected count.
#[derive(Debug, Clone, Default)]
pub struct CsvReferenceCounts {
    counts: StaticReferenceCounts,
}

impl CsvReferenceCounts {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, AnnotatorError> {
        Self::parse(&fs::read_to_string(path)?)
    }

    pub fn parse(content: &str) -> Result<Self, AnnotatorError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(content.as_bytes());

        let headers = reader.headers()?.clone();
        let column = |name: &'static str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or(AnnotatorError::MissingColumn(name))
        };
        let (x, y) = (column("x")?, column("y")?);

        let mut counts = StaticReferenceCounts::new();
        for record in reader.records() {
            let record = record?;
            match (record.get(x), record.get(y).and_then(|v| v.parse::<u32>().ok())) {
                (Some(stem), Some(count)) if !stem.is_empty() => counts.insert(stem, count),
                _ => warn!("Skipping reference row {:?}", record),
            }
        }

        info!("Loaded {} reference counts", counts.len());
        Ok(Self { counts })
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

impl ReferenceCounts for CsvReferenceCounts {
    fn lookup_reference_count(&self, image_name: &str) -> Option<u32> {
        self.counts.lookup_reference_count(image_name)
    }
}

/// Writes under one destination directory. Masks go to the directory itself
/// or its `mismatched` folder; source copies go to its `original` folder.
#[derive(Debug, Clone)]
pub struct FsPersistence {
    destination: PathBuf,
}

impl FsPersistence {
    pub const SECONDARY_DIR: &'static str = "mismatched";
    pub const ORIGIN_DIR: &'static str = "original";

    pub fn new<P: Into<PathBuf>>(destination: P) -> Self {
        Self { destination: destination.into() }
    }

    pub fn directory(&self, destination: &Destination) -> PathBuf {
        match destination {
            Destination::Primary => self.destination.clone(),
            Destination::Secondary => self.destination.join(Self::SECONDARY_DIR),
            Destination::Origin => self.destination.join(Self::ORIGIN_DIR),
            Destination::Other(path) => path.clone(),
        }
    }

    /// `name` with its extension replaced by `format`.
    pub fn file_path(&self, name: &str, format: &str, destination: &Destination) -> PathBuf {
        let file = Path::new(name).with_extension(format.trim_start_matches('.'));
        self.directory(destination).join(file)
    }
}

impl PersistenceProvider for FsPersistence {
    /// Origin saves write the raster in RGB order; every other destination
    /// receives the mask.
    fn save(&mut self, image: &Image, name: &str, format: &str, destination: &Destination) -> cellmask::Result<()> {
        if format.trim_start_matches('.').is_empty() {
            return Err(cellmask::CellMaskError::Persistence(format!(
                "no format given for '{}'",
                name
            )));
        }

        let path = self.file_path(name, format, destination);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        match destination {
            Destination::Origin => image.raster().to_rgb().save(&path)?,
            _ => image.mask().as_gray().save(&path)?,
        }
        debug!("Wrote {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cellmask::{Coordinate, NoReferenceCounts, Session, SessionConfig};
    use image::{Rgb, RgbImage};

    fn create_test_image() -> RgbImage {
        RgbImage::from_fn(20, 20, |x, y| {
            if (5..10).contains(&x) && (5..10).contains(&y) { Rgb([20, 20, 20]) } else { Rgb([220, 220, 220]) }
        })
    }

    #[test]
    fn test_csv_reference_counts() {
        let counts = CsvReferenceCounts::parse("id,x,y\n0,tile_a,3\n1,tile_b,0\n2,tile_c,many\n")
            .expect("Valid CSV");
        assert_eq!(counts.len(), 2);
        assert_eq!(counts.lookup_reference_count("tile_a"), Some(3));
        assert_eq!(counts.lookup_reference_count("tile_b"), Some(0));
        assert_eq!(counts.lookup_reference_count("tile_c"), None);
    }

    #[test]
    fn test_csv_quoted_fields() {
        let counts = CsvReferenceCounts::parse("\"x\",\"y\"\n\"tile_a\",3\n\"tile, b\",\"4\"\n")
            .expect("Valid CSV");
        assert_eq!(counts.lookup_reference_count("tile_a"), Some(3));
        assert_eq!(counts.lookup_reference_count("tile, b"), Some(4));

        let counts = CsvReferenceCounts::parse("x,y\n\"tile_a\",3\n").expect("Valid CSV");
        assert_eq!(counts.lookup_reference_count("tile_a"), Some(3));
    }

    #[test]
    fn test_csv_reference_file() {
        let dir = tempfile::tempdir().expect("Create temp dir");
        let path = dir.path().join("counts.csv");
        fs::write(&path, "x,y\r\ntile_a,2\r\n\r\ntile_b,5\r\n").expect("Write CSV");

        let counts = CsvReferenceCounts::from_file(&path).expect("Read CSV");
        assert_eq!(counts.len(), 2);
        assert_eq!(counts.lookup_reference_count("tile_b"), Some(5));
    }

    #[test]
    fn test_csv_missing_column() {
        let result = CsvReferenceCounts::parse("name,count\na,1\n");
        assert!(matches!(result, Err(AnnotatorError::MissingColumn("x"))));
    }

    #[test]
    fn test_file_paths() {
        let persistence = FsPersistence::new("/data/out");
        assert_eq!(
            persistence.file_path("tile_mask.png", ".png", &Destination::Primary),
            PathBuf::from("/data/out/tile_mask.png")
        );
        assert_eq!(
            persistence.file_path("tile.png", ".tif", &Destination::Origin),
            PathBuf::from("/data/out/original/tile.tif")
        );
        assert_eq!(
            persistence.file_path("tile_mask", "png", &Destination::Secondary),
            PathBuf::from("/data/out/mismatched/tile_mask.png")
        );
    }

    #[test]
    fn test_directory_navigation_and_saving() {
        let source_dir = tempfile::tempdir().expect("Create temp dir");
        let destination_dir = tempfile::tempdir().expect("Create temp dir");
        let (source, destination) = (source_dir.path(), destination_dir.path());
        create_test_image().save(source.join("b.png")).expect("Write image");
        create_test_image().save(source.join("a.bmp")).expect("Write image");
        fs::write(source.join("notes.txt"), "not an image").expect("Write text");

        let navigator = DirectoryNavigator::open(source).expect("Open directory");
        assert_eq!(navigator.image_count(), 2);

        let mut session = Session::new(
            navigator,
            NoReferenceCounts,
            FsPersistence::new(destination),
            SessionConfig::default(),
        );
        assert!(session.open_current().expect("Open"));
        assert_eq!(session.source().expect("Source").name(), "a.bmp");

        session.grow_region(&[Coordinate::new(7, 7)], "10", "20").expect("Grow");
        session.save_preview_mask("", Some(".png")).expect("Save");
        session.save_source_image("").expect("Save");

        let mask = image::open(destination.join("a_mask.png")).expect("Mask written").to_luma8();
        assert_eq!(mask.get_pixel(7, 7).0, [255]);
        assert_eq!(mask.get_pixel(0, 0).0, [0]);
        assert_eq!(mask.pixels().filter(|p| p.0[0] == 255).count(), 25);
        assert!(destination.join("original").join("a.bmp").exists());
    }

    #[test]
    fn test_save_without_format_fails() {
        let image = Image::new("x.png", "", Raster::from_rgb(RgbImage::new(2, 2)));
        let dir = tempfile::tempdir().expect("Create temp dir");
        let mut persistence = FsPersistence::new(dir.path());
        assert!(persistence.save(&image, "x", "", &Destination::Primary).is_err());
    }
}
