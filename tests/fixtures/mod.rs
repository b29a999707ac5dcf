//! Chart fixtures for pipeline tests
//!
//! A throwaway chart checkout: defaults, templates, docs and a
//! `docgen.toml`, all under one temporary directory.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use envdoc::DocgenConfig;
use tempfile::TempDir;

pub const DOMAIN_VALUES: &str = "\
# Domain name
domain: example.com
# Listening port
port: 8080
# Host prefix
host: broker
global:
  ingress:
    # Cluster domain
    domainName: kyma.example.com
";

pub const DOMAIN_DEPLOYMENT: &str = r#"apiVersion: apps/v1
kind: Deployment
spec:
  template:
    spec:
      containers:
        - name: broker
          env:
            - name: DOMAIN
              value: "{{ .Values.domain }}"
            - name: HOST
              value: "{{ .Values.host }}.{{ .Values.global.ingress.domainName }}"
            - name: SECRET
              valueFrom:
                secretKeyRef:
                  name: broker
                  key: secret
          ports:
            - name: http
              containerPort: 8080
"#;

pub const JOBS_MANIFEST: &str = r#"apiVersion: v1
kind: ServiceAccount
---
kind: CronJob
spec:
  containers:
    - name: job-a
      env:
        - name: JOB_A_PORT
          value: "{{ .Values.port }}"
---
kind: CronJob
spec:
  containers:
    - name: job-b
      env:
        - name: JOB_B_DOMAIN
          value: "{{ .Values.domain }}"
"#;

/// A chart checkout in a temporary directory.
pub struct Chart {
    dir: TempDir,
}

impl Chart {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create temp dir"),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    pub fn write(&self, rel: &str, contents: &str) -> PathBuf {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create fixture dir");
        }
        fs::write(&path, contents).expect("write fixture");
        path
    }

    pub fn read(&self, rel: &str) -> String {
        fs::read_to_string(self.path(rel)).expect("read fixture")
    }

    pub fn exists(&self, rel: &str) -> bool {
        self.path(rel).exists()
    }

    /// Write `docgen.toml` and load it the way the CLI does.
    pub fn config(&self, toml: &str) -> DocgenConfig {
        let path = self.write("docgen.toml", toml);
        DocgenConfig::from_file(&path).expect("load docgen.toml")
    }
}
