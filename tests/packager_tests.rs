#[cfg(all(test, unix))]
mod tests {
    use makedmg::Stage;
    use makedmg::packager::{
        CodeSigner, DmgSettings, Error, ImageCreator, ImageParams, LICENSE_FILE, Packager,
        PackagingRequest, PlatformCapabilities, Result, SigningConfig,
    };
    use std::{
        fs,
        path::{Path, PathBuf},
        sync::{Arc, Mutex},
        time::Duration,
    };
    use tempfile::TempDir;
    use walkdir::WalkDir;

    /// Snapshot of the staged tree taken while the image tool runs.
    #[derive(Debug, Clone)]
    struct Capture {
        source_folder: PathBuf,
        volume_name: String,
        entries: Vec<String>,
        applications_target: Option<PathBuf>,
    }

    #[derive(Default)]
    struct FakeImager {
        fail: bool,
        captured: Mutex<Option<Capture>>,
    }

    impl FakeImager {
        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        fn capture(&self) -> Option<Capture> {
            self.captured.lock().unwrap().clone()
        }
    }

    impl ImageCreator for FakeImager {
        async fn create_image(&self, params: &ImageParams<'_>) -> Result<()> {
            let entries = WalkDir::new(params.source_folder)
                .follow_links(false)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|e| e.ok())
                .filter_map(|e| {
                    e.path()
                        .strip_prefix(params.source_folder)
                        .ok()
                        .map(|p| p.to_string_lossy().into_owned())
                })
                .filter(|p| !p.is_empty())
                .collect();
            let applications_target =
                fs::read_link(params.source_folder.join("Applications")).ok();

            *self.captured.lock().unwrap() = Some(Capture {
                source_folder: params.source_folder.to_path_buf(),
                volume_name: params.volume_name.to_string(),
                entries,
                applications_target,
            });

            if self.fail {
                return Err(Error::ToolFailed {
                    tool: "hdiutil".to_string(),
                    code: Some(1),
                    stderr: "create failed - No space left on device".to_string(),
                });
            }
            fs::write(params.output, b"fake disk image")?;
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeSigner {
        fail: bool,
        calls: Mutex<Vec<(PathBuf, String, Vec<String>)>>,
    }

    impl CodeSigner for FakeSigner {
        async fn sign(&self, bundle: &Path, identity: &str, flags: &[String]) -> Result<()> {
            self.calls.lock().unwrap().push((
                bundle.to_path_buf(),
                identity.to_string(),
                flags.to_vec(),
            ));
            if self.fail {
                return Err(Error::ToolFailed {
                    tool: "codesign".to_string(),
                    code: Some(1),
                    stderr: "no identity found".to_string(),
                });
            }
            Ok(())
        }
    }

    struct Fixture {
        _root: TempDir,
        source: PathBuf,
        binary: PathBuf,
        target: PathBuf,
    }

    fn fixture(with_license: bool) -> Fixture {
        let root = TempDir::new().unwrap();
        let source = root.path().join("src");
        let binary = root.path().join("install").join("MyApp");
        fs::create_dir_all(&source).unwrap();
        if with_license {
            fs::write(source.join(LICENSE_FILE), "GPL-3.0 with exception").unwrap();
        }

        let macos = binary.join("MyApp.app/Contents/MacOS");
        fs::create_dir_all(&macos).unwrap();
        fs::write(macos.join("MyApp"), "binary").unwrap();
        fs::write(binary.join("MyApp.app/Contents/Info.plist"), "<plist/>").unwrap();
        let dsym = binary.join("MyApp.app.dSYM/Contents/Resources/DWARF");
        fs::create_dir_all(&dsym).unwrap();
        fs::write(dsym.join("MyApp"), "dwarf").unwrap();
        fs::write(binary.join("plugin.debug"), "dwarf").unwrap();

        let target = root.path().join("out").join("MyApp.dmg");
        Fixture {
            source,
            binary,
            target,
            _root: root,
        }
    }

    fn quick_settings() -> DmgSettings {
        DmgSettings {
            settle: Duration::ZERO,
            ..DmgSettings::default()
        }
    }

    fn request(f: &Fixture) -> PackagingRequest {
        PackagingRequest::new(&f.target, "My App", &f.source, &f.binary).unwrap()
    }

    #[tokio::test]
    async fn test_package_produces_drag_install_layout() {
        let f = fixture(true);
        let packager = Packager::new(FakeSigner::default(), FakeImager::default())
            .with_capabilities(PlatformCapabilities::none())
            .with_settings(quick_settings());

        let image = packager.package(&request(&f)).await.unwrap();

        assert_eq!(image.path, f.target);
        assert_eq!(image.size, b"fake disk image".len() as u64);
        assert_eq!(image.checksum.len(), 64);
        assert!(!image.signed);
        assert!(image.cleanup_error.is_none());

        let capture = packager_capture(&packager);
        assert_eq!(capture.volume_name, "My App");
        assert_eq!(capture.source_folder.file_name().unwrap(), "MyApp");
        assert!(capture.entries.contains(&"MyApp.app/Contents/MacOS/MyApp".to_string()));
        assert!(capture.entries.contains(&LICENSE_FILE.to_string()));
        assert!(capture.entries.contains(&"Applications".to_string()));
        assert!(!capture.entries.iter().any(|e| e.contains(".dSYM")));
        assert!(!capture.entries.iter().any(|e| e.ends_with(".debug")));
        assert_eq!(
            capture.applications_target.as_deref(),
            Some(Path::new("/Applications"))
        );

        let staging_root = capture.source_folder.parent().unwrap();
        assert!(!staging_root.exists(), "staging root should be removed");
        assert!(f.binary.join("MyApp.app.dSYM").exists(), "input must be untouched");
    }

    fn packager_capture(packager: &Packager<FakeSigner, FakeImager>) -> Capture {
        packager.creator().capture().expect("image tool was not invoked")
    }

    #[tokio::test]
    async fn test_image_failure_still_removes_staging_root() {
        let f = fixture(true);
        let packager = Packager::new(FakeSigner::default(), FakeImager::failing())
            .with_capabilities(PlatformCapabilities::none())
            .with_settings(quick_settings());

        let err = packager.package(&request(&f)).await.unwrap_err();

        assert_eq!(err.failed_stage(), Some(Stage::BuildImage));
        assert!(err.to_string().contains("No space left on device"));
        let capture = packager_capture(&packager);
        assert!(!capture.source_folder.parent().unwrap().exists());
        assert!(!f.target.exists());
    }

    #[tokio::test]
    async fn test_missing_license_stops_before_imaging() {
        let f = fixture(false);
        let packager = Packager::new(FakeSigner::default(), FakeImager::default())
            .with_capabilities(PlatformCapabilities::none())
            .with_settings(quick_settings());

        let err = packager.package(&request(&f)).await.unwrap_err();

        assert_eq!(err.failed_stage(), Some(Stage::Validate));
        assert!(err.to_string().contains(LICENSE_FILE));
        assert!(packager.creator().capture().is_none());
    }

    #[tokio::test]
    async fn test_signs_app_bundle_on_capable_host() {
        let f = fixture(true);
        let packager = Packager::new(FakeSigner::default(), FakeImager::default())
            .with_capabilities(PlatformCapabilities::all())
            .with_signing(SigningConfig::new(Some("Developer ID"), Some("--timestamp")))
            .with_settings(quick_settings());

        let image = packager.package(&request(&f)).await.unwrap();

        assert!(image.signed);
        let calls = packager.signer().calls.lock().unwrap().clone();
        assert_eq!(calls.len(), 1);
        let (bundle, identity, flags) = &calls[0];
        assert_eq!(bundle.file_name().unwrap(), "MyApp.app");
        assert_eq!(identity, "Developer ID");
        assert_eq!(flags, &vec!["--timestamp".to_string()]);
    }

    #[tokio::test]
    async fn test_signing_failure_is_attributed_to_sign_stage() {
        let f = fixture(true);
        let signer = FakeSigner {
            fail: true,
            ..FakeSigner::default()
        };
        let packager = Packager::new(signer, FakeImager::default())
            .with_capabilities(PlatformCapabilities::all())
            .with_signing(SigningConfig::new(Some("Developer ID"), None))
            .with_settings(quick_settings());

        let err = packager.package(&request(&f)).await.unwrap_err();

        assert_eq!(err.failed_stage(), Some(Stage::Sign));
        assert!(packager.creator().capture().is_none());
        assert!(!f.target.exists());
    }

    #[tokio::test]
    async fn test_progress_reports_stages_in_order() {
        let f = fixture(true);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let packager = Packager::new(FakeSigner::default(), FakeImager::default())
            .with_capabilities(PlatformCapabilities::none())
            .with_settings(quick_settings())
            .with_progress(move |stage| sink.lock().unwrap().push(stage));

        packager.package(&request(&f)).await.unwrap();

        assert_eq!(
            *seen.lock().unwrap(),
            [
                Stage::Validate,
                Stage::Stage,
                Stage::Sign,
                Stage::Augment,
                Stage::BuildImage
            ]
        );
    }

    #[tokio::test]
    async fn test_fifo_in_binary_tree_fails_staging() {
        let f = fixture(true);
        let fifo = f.binary.join("MyApp.app/Contents/control");
        let status = std::process::Command::new("mkfifo").arg(&fifo).status().unwrap();
        assert!(status.success());
        let packager = Packager::new(FakeSigner::default(), FakeImager::default())
            .with_capabilities(PlatformCapabilities::none())
            .with_settings(quick_settings());

        let err = tokio::time::timeout(Duration::from_secs(10), packager.package(&request(&f)))
            .await
            .expect("staging a FIFO must fail instead of blocking")
            .unwrap_err();

        assert_eq!(err.failed_stage(), Some(Stage::Stage));
        assert!(err.to_string().contains("special file"), "{err}");
        assert!(
            err.recovery_suggestions()
                .iter()
                .any(|s| s.contains("control"))
        );
        assert!(packager.creator().capture().is_none());
    }

    #[tokio::test]
    async fn test_target_without_extension_is_written_as_dmg() {
        let f = fixture(true);
        let bare = f.target.with_extension("");
        let request = PackagingRequest::new(&bare, "My App", &f.source, &f.binary).unwrap();
        let packager = Packager::new(FakeSigner::default(), FakeImager::default())
            .with_capabilities(PlatformCapabilities::none())
            .with_settings(quick_settings());

        let image = packager.package(&request).await.unwrap();

        assert_eq!(image.path, f.target);
        assert!(f.target.is_file());
        assert!(!bare.exists());
    }

    #[tokio::test]
    async fn test_no_app_bundle_fails_on_capable_host() {
        let f = fixture(true);
        fs::remove_dir_all(f.binary.join("MyApp.app")).unwrap();
        let packager = Packager::new(FakeSigner::default(), FakeImager::default())
            .with_capabilities(PlatformCapabilities::all())
            .with_settings(quick_settings());

        let err = packager.package(&request(&f)).await.unwrap_err();

        assert_eq!(err.failed_stage(), Some(Stage::Sign));
        assert!(matches!(
            err,
            makedmg::PackageError::Stage {
                source: Error::NoAppBundle { .. },
                ..
            }
        ));
    }
}
