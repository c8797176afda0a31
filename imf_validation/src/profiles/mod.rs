//! Application profiles, and the registry that picks one by namespace.
//!
//! A composition names the application profiles it conforms to by XML
//! namespace. Each profile is an [`ApplicationProfileValidator`], which
//! returns its findings instead of failing: one profile's problems never
//! stop its siblings from running.

use std::sync::Arc;

use imf_validation_types::primitives::Rational;
use rustc_hash::FxHashMap;

use crate::{
    error_log::{ErrorCode, ErrorLevel, ErrorLog, ErrorObject},
    header::HeaderPartition,
    partition::PartitionPack,
};

pub mod app2e;
pub mod app5;
pub mod audio;
pub mod characteristics;
pub mod iab;
pub mod image;
pub mod mga;

use audio::AudioEssenceDescriptorModel;
use image::ImageEssenceDescriptorModel;

/// The kinds of virtual track a composition can have.
#[derive(Clone, Copy, Debug, Hash, PartialEq, PartialOrd, Eq, Ord)]
pub enum VirtualTrackKind {
    MainImage,
    MainAudio,
    Iab,
    Mga,
    Other,
}

/// The essence model of one track file a virtual track plays.
#[derive(Clone, Debug, PartialEq)]
pub enum ResourceEssence {
    Image(ImageEssenceDescriptorModel),
    Audio(AudioEssenceDescriptorModel),
}

impl ResourceEssence {
    pub fn as_image(&self) -> Option<&ImageEssenceDescriptorModel> {
        match self {
            ResourceEssence::Image(i) => Some(i),
            ResourceEssence::Audio(_) => None,
        }
    }

    pub fn as_audio(&self) -> Option<&AudioEssenceDescriptorModel> {
        match self {
            ResourceEssence::Audio(a) => Some(a),
            ResourceEssence::Image(_) => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct VirtualTrackSummary {
    pub kind: VirtualTrackKind,
    pub edit_rate: Rational,
    pub resources: Vec<ResourceEssence>,
}

/// What the profiles need to know about a composition.
///
/// Building this from a CPL is the XML layer's job.
#[derive(Clone, Debug, PartialEq)]
pub struct CompositionSummary {
    pub edit_rate: Rational,
    pub virtual_tracks: Vec<VirtualTrackSummary>,
}

impl CompositionSummary {
    /// Virtual tracks of one kind.
    pub fn tracks_of(&self, kind: VirtualTrackKind) -> impl Iterator<Item = &VirtualTrackSummary> {
        self.virtual_tracks.iter().filter(move |t| t.kind == kind)
    }
}

/// One application profile's constraints.
pub trait ApplicationProfileValidator: Send + Sync {
    /// The profile's name, as used in error descriptions.
    fn constraints_specification(&self) -> &'static str;

    /// Checks a whole composition.
    fn validate_composition_constraints(&self, composition: &CompositionSummary)
    -> Vec<ErrorObject>;

    /// Checks one track file's header partition.
    fn validate_track_file_constraints(&self, header: &HeaderPartition) -> Vec<ErrorObject>;

    /// Checks a track file's partitions.
    ///
    /// By default, every partition carrying essence must list the top-level
    /// descriptor's essence container.
    fn validate_essence_partition_constraints(
        &self,
        header: &HeaderPartition,
        packs: &[PartitionPack],
    ) -> Vec<ErrorObject> {
        let mut log = ErrorLog::new();
        check_essence_partition_containers(self.constraints_specification(), header, packs, &mut log);
        log.into_errors()
    }
}

pub(crate) fn check_essence_partition_containers(
    specification: &str,
    header: &HeaderPartition,
    packs: &[PartitionPack],
    log: &mut ErrorLog,
) {
    let Some(container) = header
        .top_level_descriptor()
        .and_then(|d| d.as_file_descriptor())
        .map(|f| f.essence_container)
    else {
        return;
    };

    for pack in packs.iter().filter(|p| p.has_essence_container()) {
        let listed = pack
            .essence_containers
            .iter()
            .any(|ec| ec.equals_ignoring_version(&container));
        if !listed {
            log.add_error(
                ErrorCode::ImfEssenceComponentError,
                ErrorLevel::NonFatal,
                format!(
                    "{specification}: partition at offset `{}` doesn't list essence container `{container}`.",
                    pack.byte_offset
                ),
            );
        }
    }
}

/// Logs an edit rate mismatch between a virtual track and its composition.
pub(crate) fn check_track_edit_rate(
    specification: &str,
    composition: &CompositionSummary,
    track: &VirtualTrackSummary,
    log: &mut ErrorLog,
) {
    if !track.edit_rate.same_value(&composition.edit_rate) {
        log.add_error(
            ErrorCode::ApplicationCompositionError,
            ErrorLevel::NonFatal,
            format!(
                "{specification}: `{:?}` virtual track edit rate `{}` doesn't match the composition edit rate `{}`.",
                track.kind, track.edit_rate, composition.edit_rate
            ),
        );
    }
}

/// The application profiles, keyed by namespace.
///
/// Namespaces match case-insensitively.
#[derive(Clone, Default)]
pub struct ValidatorRegistry {
    validators: FxHashMap<String, Arc<dyn ApplicationProfileValidator>>,
}

impl core::fmt::Debug for ValidatorRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut namespaces = self.namespaces();
        namespaces.sort_unstable();
        f.debug_struct("ValidatorRegistry")
            .field("namespaces", &namespaces)
            .finish()
    }
}

impl ValidatorRegistry {
    pub const APP2E_2014: &'static str = "http://www.smpte-ra.org/schemas/2067-21/2014";
    pub const APP2E_2016: &'static str = "http://www.smpte-ra.org/schemas/2067-21/2016";
    pub const APP2E_2020: &'static str = "http://www.smpte-ra.org/ns/2067-21/2020";
    pub const APP2E_2021: &'static str = "http://www.smpte-ra.org/ns/2067-21/2021";
    pub const APP5_ACES: &'static str = "http://www.smpte-ra.org/ns/2067-50/2017";
    pub const IAB: &'static str = "http://www.smpte-ra.org/ns/2067-201/2019";
    pub const MGA: &'static str = "http://www.smpte-ra.org/ns/2067-203/2022";

    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with every built-in profile.
    pub fn with_default_profiles() -> Self {
        use app2e::{App2eValidator, ProfileEdition};

        let mut registry = Self::new();
        registry.register(
            Self::APP2E_2014,
            Arc::new(App2eValidator::new(ProfileEdition::Edition2014)),
        );
        registry.register(
            Self::APP2E_2016,
            Arc::new(App2eValidator::new(ProfileEdition::Edition2016)),
        );
        registry.register(
            Self::APP2E_2020,
            Arc::new(App2eValidator::new(ProfileEdition::Edition2020)),
        );
        registry.register(
            Self::APP2E_2021,
            Arc::new(App2eValidator::new(ProfileEdition::Edition2021)),
        );
        registry.register(Self::APP5_ACES, Arc::new(app5::App5Validator));
        registry.register(Self::IAB, Arc::new(iab::IabValidator));
        registry.register(Self::MGA, Arc::new(mga::MgaValidator));
        registry
    }

    /// Adds a profile, replacing any already under this namespace.
    pub fn register(
        &mut self,
        namespace: impl AsRef<str>,
        validator: Arc<dyn ApplicationProfileValidator>,
    ) {
        let namespace = namespace.as_ref().to_ascii_lowercase();
        log::debug!(
            "Registering `{}` for `{namespace}`.",
            validator.constraints_specification()
        );
        self.validators.insert(namespace, validator);
    }

    pub fn get(&self, namespace: &str) -> Option<Arc<dyn ApplicationProfileValidator>> {
        self.validators
            .get(&namespace.to_ascii_lowercase())
            .cloned()
    }

    pub fn namespaces(&self) -> Vec<&str> {
        self.validators.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }

    /// Runs every named profile over a composition.
    ///
    /// A namespace with no profile is logged as NON_FATAL and skipped.
    pub fn validate_composition(
        &self,
        namespaces: &[&str],
        composition: &CompositionSummary,
    ) -> ErrorLog {
        self.run(namespaces, |v| v.validate_composition_constraints(composition))
    }

    /// Runs every named profile over one track file.
    pub fn validate_track_file(
        &self,
        namespaces: &[&str],
        header: &HeaderPartition,
        packs: &[PartitionPack],
    ) -> ErrorLog {
        self.run(namespaces, |v| {
            let mut errors = v.validate_track_file_constraints(header);
            errors.extend(v.validate_essence_partition_constraints(header, packs));
            errors
        })
    }

    fn run(
        &self,
        namespaces: &[&str],
        mut f: impl FnMut(&dyn ApplicationProfileValidator) -> Vec<ErrorObject>,
    ) -> ErrorLog {
        let mut log = ErrorLog::new();
        for namespace in namespaces {
            match self.get(namespace) {
                Some(validator) => {
                    let errors = f(validator.as_ref());
                    log::debug!(
                        "`{}` found `{}` problem(s).",
                        validator.constraints_specification(),
                        errors.len()
                    );
                    log.extend(errors);
                }
                None => {
                    log::warn!("No application profile is registered for `{namespace}`.");
                    log.add_error(
                        ErrorCode::ApplicationCompositionError,
                        ErrorLevel::NonFatal,
                        format!("No application profile is registered for namespace `{namespace}`."),
                    );
                }
            }
        }
        log
    }
}
