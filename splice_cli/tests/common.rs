#![allow(dead_code)]

use assert_cmd::Command;

pub fn splice_cmd() -> Command {
	let mut cmd = Command::new(env!("CARGO_BIN_EXE_splice"));
	cmd.env("NO_COLOR", "1");
	cmd.env_remove("SPLICE_LOG");
	cmd
}

pub const RESOURCES: &str = "apiVersion: v1
kind: ConfigMap
metadata:
  name: cluster
data:
  domain: example.com
  revision: deploy/citest
---
apiVersion: networking.k8s.io/v1
kind: Ingress
metadata:
  name: web
spec:
  rules:
    - host: web.placeholder.dev
---
apiVersion: argoproj.io/v1alpha1
kind: Application
metadata:
  name: apps
spec:
  source:
    helm:
      values: |
        common:
          targetRevision: main
";

pub const CONFIG: &str = "apiVersion: config.splice.dev/v1alpha1
kind: ReplacementTransformer
metadata:
  name: replacements
replacements:
  - source:
      kind: ConfigMap
      fieldPath: data.domain
    targets:
      - select:
          kind: Ingress
        fieldPaths: [spec.rules.0.host]
        options:
          delimiter: .
          index: 1
  - path: revision.yaml
";

pub const REVISION_RULE: &str = "source:
  kind: ConfigMap
  fieldPath: data.revision
targets:
  - select:
      kind: Application
    fieldPaths:
      - spec.source.helm.values.!!yaml.common.targetRevision
";
