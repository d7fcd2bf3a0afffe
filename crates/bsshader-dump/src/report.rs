//! Assembling the textual report for one shader and writing its two artifacts.

use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::catalogue::Catalogue;
use crate::cbuffer::CbufferBlock;
use crate::classify::classify_until;
use crate::config::DumpConfig;
use crate::error::{FormatError, ReportError};
use crate::shader::ShaderInstance;
use crate::{ConstantGroup, ShaderStage};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportHeader {
    pub kind: String,
    pub stage: ShaderStage,
    pub technique_id: u32,
    /// Technique display name with spaces replaced by underscores.
    pub technique_name: String,
    pub input_signature: Option<u64>,
}

/// A slot that was populated but could not be placed in any group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndefinedConstant {
    pub index: usize,
    pub name: String,
    /// Offset in 4-byte units.
    pub offset: u8,
}

/// Everything that goes into a shader's `.txt` artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub header: ReportHeader,
    pub defines: Vec<(String, String)>,
    /// `None` for stages that don't list samplers.
    pub samplers: Option<Vec<String>>,
    /// One block per group, in [`ConstantGroup::REPORT_ORDER`].
    pub blocks: Vec<(ConstantGroup, CbufferBlock)>,
    pub undefined: Vec<UndefinedConstant>,
}

/// Where a shader's artifacts go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub dir: PathBuf,
    pub report: PathBuf,
    pub bytecode: PathBuf,
}

impl ArtifactPaths {
    pub fn new(root: &Path, header: &ReportHeader) -> Self {
        let dir = root.join(&header.kind);
        let base = format!(
            "{}_{}_{:X}.{}",
            header.kind,
            header.technique_name,
            header.technique_id,
            header.stage.file_suffix()
        );
        Self {
            report: dir.join(format!("{base}.txt")),
            bytecode: dir.join(format!("{base}.hlsl")),
            dir,
        }
    }
}

/// Technique name made safe for a file name: spaces become underscores.
pub fn sanitize_technique_name(name: &str) -> String {
    name.replace(' ', "_")
}

impl Report {
    /// Classifies `shader`'s constants against `catalogue` and lays out the full report.
    pub fn assemble(catalogue: &Catalogue, shader: &ShaderInstance) -> Result<Self, FormatError> {
        Self::assemble_until(catalogue, shader, catalogue.sentinel())
    }

    /// Like [`Report::assemble`], with name and sampler tables ending at `sentinel`.
    pub fn assemble_until(
        catalogue: &Catalogue,
        shader: &ShaderInstance,
        sentinel: &str,
    ) -> Result<Self, FormatError> {
        let kind = shader.kind();
        let stage = shader.stage();
        let technique = shader.technique();
        let resolver = catalogue.resolver(kind);

        let technique_name = resolver
            .and_then(|r| r.technique_name(technique))
            .unwrap_or_else(|| format!("{technique:X}"));

        let header = ReportHeader {
            kind: kind.to_string(),
            stage,
            technique_id: technique,
            technique_name: sanitize_technique_name(&technique_name),
            // Only vertex shaders have an input layout.
            input_signature: shader
                .input_signature()
                .filter(|_| stage == ShaderStage::Vertex),
        };

        let defines = resolver.map(|r| r.defines(technique)).unwrap_or_default();

        let samplers = stage.lists_samplers().then(|| {
            let mut names = Vec::new();
            if let Some(resolver) = resolver {
                while let Some(name) = resolver.sampler_name(names.len(), technique) {
                    if name.contains(sentinel) {
                        break;
                    }
                    names.push(name.to_string());
                }
            }
            names
        });

        let classes = classify_until(catalogue, kind, stage, sentinel);
        let offsets = shader.offsets();

        let blocks = ConstantGroup::REPORT_ORDER
            .into_iter()
            .map(|group| {
                CbufferBlock::build(
                    classes.group(group),
                    offsets,
                    group.register_slot(),
                    shader.buffer(group),
                )
                .map(|block| (group, block))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let undefined = classes
            .undefined
            .iter()
            .map(|entry| {
                let offset = offsets.get(entry.index).ok_or(FormatError::SlotOutOfRange {
                    index: entry.index,
                    len: offsets.len(),
                })?;
                Ok(UndefinedConstant {
                    index: entry.index,
                    name: entry.name.to_string(),
                    offset,
                })
            })
            .collect::<Result<Vec<_>, FormatError>>()?;

        Ok(Self {
            header,
            defines,
            samplers,
            blocks,
            undefined,
        })
    }

    pub fn block(&self, group: ConstantGroup) -> Option<&CbufferBlock> {
        self.blocks
            .iter()
            .find(|(g, _)| *g == group)
            .map(|(_, block)| block)
    }

    pub fn artifact_paths(&self, root: &Path) -> ArtifactPaths {
        ArtifactPaths::new(root, &self.header)
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let header = &self.header;
        writeln!(f, "// {}", header.kind)?;
        writeln!(f, "// TechniqueID: 0x{:X}", header.technique_id)?;
        if let Some(signature) = header.input_signature {
            writeln!(f, "// Vertex description: 0x{signature:X}")?;
        }
        writeln!(f, "//")?;
        writeln!(f, "// Technique: {}", header.technique_name)?;
        writeln!(f)?;

        if !self.defines.is_empty() {
            for (name, value) in &self.defines {
                writeln!(f, "#define {name} {value}")?;
            }
            writeln!(f)?;
        }

        if let Some(samplers) = &self.samplers {
            for (slot, name) in samplers.iter().enumerate() {
                writeln!(f, "// Sampler[{slot}]: {name}")?;
            }
            writeln!(f)?;
        }

        for (_, block) in &self.blocks {
            write!(f, "{block}")?;
        }

        for entry in &self.undefined {
            writeln!(
                f,
                "// UNDEFINED PARAMETER: Index: {:02} Offset: 0x{:04X} Name: {}",
                entry.index,
                u16::from(entry.offset) * 4,
                entry.name
            )?;
        }
        Ok(())
    }
}

/// Writes `report` and `bytecode` under `root`.
///
/// Refuses to touch anything if either artifact already exists: a second instance mapping to
/// the same kind, technique and stage means technique identities collided upstream.
pub fn write_artifacts(
    report: &Report,
    bytecode: &[u8],
    root: &Path,
) -> Result<ArtifactPaths, ReportError> {
    let paths = report.artifact_paths(root);

    for existing in [&paths.report, &paths.bytecode] {
        if existing.exists() {
            tracing::error!(path = %existing.display(), "shader dump already exists");
            return Err(ReportError::AlreadyExists {
                path: existing.clone(),
            });
        }
    }

    fs::create_dir_all(&paths.dir).map_err(|source| ReportError::Io {
        path: paths.dir.clone(),
        source,
    })?;

    let text = report.to_string();
    write_new(&paths.report, text.as_bytes())?;
    tracing::debug!(path = %paths.report.display(), "wrote shader report");

    if bytecode.is_empty() {
        tracing::debug!(kind = %report.header.kind, "no bytecode to dump");
    } else {
        write_new(&paths.bytecode, bytecode)?;
        tracing::debug!(
            path = %paths.bytecode.display(),
            len = bytecode.len(),
            "wrote shader bytecode"
        );
    }

    Ok(paths)
}

fn write_new(path: &Path, bytes: &[u8]) -> Result<(), ReportError> {
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|source| match source.kind() {
            io::ErrorKind::AlreadyExists => ReportError::AlreadyExists {
                path: path.to_path_buf(),
            },
            _ => ReportError::Io {
                path: path.to_path_buf(),
                source,
            },
        })?;
    file.write_all(bytes).map_err(|source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Assembles the report for `shader` and writes both artifacts under `config.output_root`.
///
/// `config.sentinel`, when set, replaces the catalogue's end-of-table marker.
pub fn dump_shader(
    catalogue: &Catalogue,
    shader: &ShaderInstance,
    config: &DumpConfig,
) -> Result<ArtifactPaths, ReportError> {
    let sentinel = config.sentinel.as_deref().unwrap_or(catalogue.sentinel());
    let report = Report::assemble_until(catalogue, shader, sentinel)?;
    write_artifacts(&report, shader.bytecode(), &config.output_root)
}
