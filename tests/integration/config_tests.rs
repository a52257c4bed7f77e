use clap::Parser;
use dupcrawl::cli::Cli;
use dupcrawl::config::Config;
use dupcrawl::scanner::HashAlgorithm;
use figment::Jail;
use std::path::Path;

#[test]
fn test_config_layers_file_then_env_then_cli() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "dupcrawl.toml",
            r#"
excludes = [".git", "node_modules"]
max_depth = 4
algorithm = "blake3"
cpu_multiplier = 2
"#,
        )?;
        jail.set_env("DUPCRAWL_MAX_DEPTH", "5");
        jail.set_env("DUPCRAWL_SAMPLE", "false");

        let mut config = Config::load(Some(Path::new("dupcrawl.toml"))).unwrap();
        assert_eq!(config.max_depth, 5);
        assert!(!config.sample);
        assert_eq!(config.algorithm, HashAlgorithm::Blake3);
        assert_eq!(config.cpu_multiplier, 2);
        assert_eq!(config.excludes, vec![".git", "node_modules"]);

        let cli = Cli::try_parse_from(["dupcrawl", "-d", "7", "--algorithm", "sha1", "root"])
            .unwrap();
        config.apply_cli(&cli).unwrap();
        assert_eq!(config.max_depth, 7);
        assert_eq!(config.algorithm, HashAlgorithm::Sha1);
        // Untouched by the command line
        assert_eq!(config.excludes, vec![".git", "node_modules"]);

        let options = config.walk_options();
        assert_eq!(options.max_depth, 7);
        assert!(!options.sample);
        assert_eq!(options.cpu_multiplier, 2);
        Ok(())
    });
}

#[test]
fn test_config_env_only() {
    Jail::expect_with(|jail| {
        jail.create_file("empty.toml", "")?;
        jail.set_env("DUPCRAWL_FOLLOW_SYMLINKS", "true");
        jail.set_env("DUPCRAWL_CHUNK_SIZE", "4096");

        let config = Config::load(Some(Path::new("empty.toml"))).unwrap();
        assert!(config.follow_symlinks);
        assert_eq!(config.chunk_size, 4096);
        assert!(config.parallel);
        Ok(())
    });
}

#[test]
fn test_config_invalid_values_are_rejected() {
    Jail::expect_with(|jail| {
        jail.create_file("bad_type.toml", "max_depth = \"deep\"")?;
        assert!(Config::load(Some(Path::new("bad_type.toml"))).is_err());

        jail.create_file("bad_algo.toml", "algorithm = \"md5\"")?;
        assert!(Config::load(Some(Path::new("bad_algo.toml"))).is_err());

        jail.create_file("zero.toml", "cpu_multiplier = 0")?;
        assert!(Config::load(Some(Path::new("zero.toml"))).is_err());

        jail.create_file("broken.toml", "this is not toml")?;
        assert!(Config::load(Some(Path::new("broken.toml"))).is_err());
        Ok(())
    });
}

#[test]
fn test_config_unknown_keys_are_ignored() {
    Jail::expect_with(|jail| {
        jail.create_file("extra.toml", "strict = true\ntheme = \"dark\"\n")?;
        let config = Config::load(Some(Path::new("extra.toml"))).unwrap();
        assert!(config.strict);
        Ok(())
    });
}
