use crate::Document;
use crate::parse_documents;

pub(crate) const SSH_CONFIG: &str = "PubkeyAcceptedKeyTypes +ssh-rsa
Host sishserver
  HostName holepunch.in
  Port 2222
  BatchMode yes
  IdentityFile ~/.ssh_keys/id_rsa
  IdentitiesOnly yes
  LogLevel ERROR
  ServerAliveInterval 10
  ServerAliveCountMax 2
  RemoteCommand sni-proxy=true
  RemoteForward citest.holepunch.in:443 traefik.traefik.svc:443
";

pub(crate) const SSH_CONFIG_BASE64: &str = "UHVia2V5QWNjZXB0ZWRLZXlUeXBlcyArc3NoLXJzYQpIb3N0IHNpc2hzZXJ2ZXIKICBIb3N0TmFtZSBob2xlcHVuY2guaW4KICBQb3J0IDIyMjIKICBCYXRjaE1vZGUgeWVzCiAgSWRlbnRpdHlGaWxlIH4vLnNzaF9rZXlzL2lkX3JzYQogIElkZW50aXRpZXNPbmx5IHllcwogIExvZ0xldmVsIEVSUk9SCiAgU2VydmVyQWxpdmVJbnRlcnZhbCAxMAogIFNlcnZlckFsaXZlQ291bnRNYXggMgogIFJlbW90ZUNvbW1hbmQgc25pLXByb3h5PXRydWUKICBSZW1vdGVGb3J3YXJkIGNpdGVzdC5ob2xlcHVuY2guaW46NDQzIHRyYWVmaWsudHJhZWZpay5zdmM6NDQzCg==";

/// [`SSH_CONFIG_BASE64`] with `HostName` set to `karmafun.dev`.
pub(crate) const SSH_CONFIG_MODIFIED_BASE64: &str = "UHVia2V5QWNjZXB0ZWRLZXlUeXBlcyArc3NoLXJzYQpIb3N0IHNpc2hzZXJ2ZXIKICBIb3N0TmFtZSBrYXJtYWZ1bi5kZXYKICBQb3J0IDIyMjIKICBCYXRjaE1vZGUgeWVzCiAgSWRlbnRpdHlGaWxlIH4vLnNzaF9rZXlzL2lkX3JzYQogIElkZW50aXRpZXNPbmx5IHllcwogIExvZ0xldmVsIEVSUk9SCiAgU2VydmVyQWxpdmVJbnRlcnZhbCAxMAogIFNlcnZlckFsaXZlQ291bnRNYXggMgogIFJlbW90ZUNvbW1hbmQgc25pLXByb3h5PXRydWUKICBSZW1vdGVGb3J3YXJkIGNpdGVzdC5ob2xlcHVuY2guaW46NDQzIHRyYWVmaWsudHJhZWZpay5zdmM6NDQzCg==";

pub(crate) const SSH_HOSTNAME_PATH: &str = r"!!base64.!!regex.\s+HostName\s+(\S+).1";

pub(crate) const YAML_VALUES: &str = "uninode: true
common:
  targetRevision: main
apps:
  enabled: true
";

pub(crate) const JSON_VALUES: &str = r#"{
  "common": {
    "targetRevision": "main"
  },
  "uninode": true,
  "apps": {
    "enabled": true
  }
}"#;

pub(crate) const TOML_VALUES: &str = "uninode = true

[common]
targetRevision = \"main\"

[apps]
enabled = true
";

pub(crate) const INI_VALUES: &str = "uninode = true
[common]
targetRevision = main
[apps]
enabled = true
";

/// Parse a multi-document YAML stream, panicking on malformed input.
pub(crate) fn documents(yaml: &str) -> Vec<Document> {
	parse_documents(yaml, "<fixture>").unwrap_or_else(|e| panic!("fixture: {e}"))
}

pub(crate) fn document(yaml: &str) -> Document {
	Document::from_yaml(yaml).unwrap_or_else(|e| panic!("fixture: {e}"))
}

/// A source config map, a deployment and an ingress.
pub(crate) fn cluster_resources() -> Vec<Document> {
	documents(
		"apiVersion: v1
kind: ConfigMap
metadata:
  name: cluster
  namespace: infra
data:
  domain: example.com
  revision: v1.2.3
  image: registry.local/app:1.0
---
apiVersion: apps/v1
kind: Deployment
metadata:
  name: web
  labels:
    app: web
    tier: frontend
spec:
  template:
    spec:
      containers:
        - name: web
          image: nginx:latest
          env:
            - name: DOMAIN
              value: placeholder
        - name: sidecar
          image: envoy:latest
---
apiVersion: networking.k8s.io/v1
kind: Ingress
metadata:
  name: web
  annotations:
    splice.dev/managed: \"true\"
spec:
  rules:
    - host: web.placeholder.dev
",
	)
}

/// An argo application whose helm values are embedded YAML text.
pub(crate) fn application_with_values() -> Vec<Document> {
	documents(
		"apiVersion: v1
kind: ConfigMap
metadata:
  name: revision
data:
  revision: deploy/citest
---
apiVersion: argoproj.io/v1alpha1
kind: Application
metadata:
  name: apps
spec:
  source:
    helm:
      values: |
        uninode: true
        common:
          targetRevision: main
        apps:
          enabled: true
      parameters:
        - name: common.targetRevision
          value: main
        - name: common.repoURL
          value: https://github.com/example/autocloud.git
",
	)
}

/// A config map that was renamed from `old-settings` in namespace `legacy`.
pub(crate) fn renamed_config_map() -> Document {
	document(
		"apiVersion: v1
kind: ConfigMap
metadata:
  name: settings
  namespace: apps
  annotations:
    internal.config.kubernetes.io/previousNames: old-settings
    internal.config.kubernetes.io/previousNamespaces: legacy
    internal.config.kubernetes.io/previousKinds: ConfigMap
data:
  color: blue
",
	)
}
