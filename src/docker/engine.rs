//! `ImageBuilder` backed by the Docker Engine API

use std::collections::HashMap;

use bollard::Docker;
use bollard::auth::DockerCredentials;
#[allow(deprecated)]
use bollard::image::{BuildImageOptions, PushImageOptions, TagImageOptions};
use bytes::Bytes;
use futures::StreamExt;
use http_body_util::{Either, Full};
use tracing::{debug, info};

use crate::config::RegistryCredentials;
use crate::docker::builder::{BuildRequest, BuiltImage, ImageBuilder};
use crate::docker::context::create_context;
use crate::docker::error::DockerError;

/// Docker Engine client shared by all workers of a run
pub struct DockerEngine {
    docker: Docker,
    credentials: Option<DockerCredentials>,
}

impl DockerEngine {
    pub fn new(docker: Docker, credentials: Option<&RegistryCredentials>) -> Self {
        Self {
            docker,
            credentials: credentials.map(|c| DockerCredentials {
                username: Some(c.username.clone()),
                password: Some(c.password.clone()),
                ..Default::default()
            }),
        }
    }

    /// Connects to the local daemon (socket, or `DOCKER_HOST`)
    pub fn connect(credentials: Option<&RegistryCredentials>) -> Result<Self, DockerError> {
        let docker = Docker::connect_with_local_defaults()?;
        Ok(Self::new(docker, credentials))
    }
}

#[async_trait::async_trait]
impl ImageBuilder for DockerEngine {
    async fn build(&self, request: &BuildRequest) -> Result<BuiltImage, DockerError> {
        let context_path = request.context_path.clone();
        let dockerfile = request.dockerfile.clone();
        let context = tokio::task::spawn_blocking(move || create_context(&context_path, &dockerfile))
            .await
            .map_err(|e| DockerError::Io(std::io::Error::other(e)))??;

        let reference = request.reference.as_str();
        let dockerfile = request.dockerfile.to_string_lossy();
        let build_args: HashMap<&str, &str> = request
            .build_args
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();

        #[allow(deprecated)]
        let options = BuildImageOptions {
            dockerfile: dockerfile.as_ref(),
            t: reference,
            buildargs: build_args,
            rm: true,
            forcerm: true,
            ..Default::default()
        };
        debug!("Build options: {:?}", options);

        let body = Full::new(Bytes::from(context));
        let mut stream = self
            .docker
            .build_image(options, None, Some(Either::Left(body)));

        let mut log = Vec::new();
        while let Some(msg) = stream.next().await {
            let output = match msg {
                Ok(output) => output,
                Err(e) => {
                    return Err(DockerError::Build {
                        message: e.to_string(),
                        log,
                    });
                }
            };

            if let Some(line) = output.stream {
                let line = line.trim_end();
                if !line.is_empty() {
                    debug!("{}", line);
                    log.push(line.to_string());
                }
            }

            if let Some(error) = output.error {
                return Err(DockerError::Build {
                    message: error,
                    log,
                });
            }

            if let Some(error_detail) = output.error_detail {
                let message = error_detail
                    .message
                    .unwrap_or_else(|| "Unknown build error".to_string());
                return Err(DockerError::Build { message, log });
            }

            if let Some(status) = output.status {
                log.push(status);
            }
        }

        let id = self
            .docker
            .inspect_image(reference)
            .await?
            .id
            .ok_or_else(|| DockerError::Build {
                message: format!("no image id reported for {}", reference),
                log,
            })?;

        info!("Built image {}", id);
        Ok(BuiltImage { id })
    }

    async fn tag(&self, image: &BuiltImage, repo: &str, tag: &str) -> Result<(), DockerError> {
        #[allow(deprecated)]
        let options = TagImageOptions { repo, tag };
        self.docker.tag_image(&image.id, Some(options)).await?;
        Ok(())
    }

    async fn push(&self, reference: &str) -> Result<(), DockerError> {
        let (image, tag) = split_image_tag(reference);

        #[allow(deprecated)]
        let options = PushImageOptions::<String> { tag };

        #[allow(deprecated)]
        let mut stream = self
            .docker
            .push_image(&image, Some(options), self.credentials.clone());

        while let Some(result) = stream.next().await {
            match result {
                Ok(info) => {
                    if let Some(err) = info.error {
                        return Err(DockerError::Push(err));
                    }
                    if let Some(status) = info.status {
                        debug!("{}: {}", reference, status);
                    }
                }
                Err(e @ bollard::errors::Error::DockerResponseServerError { .. }) => {
                    return Err(DockerError::Push(e.to_string()));
                }
                Err(e) => return Err(DockerError::Connection(e.to_string())),
            }
        }

        Ok(())
    }
}

/// Splits `repo:tag`, leaving a registry port in the repository part.
///
/// # Examples
/// - `atlassian/jira:8.0` -> `("atlassian/jira", "8.0")`
/// - `localhost:5000/app:dev` -> `("localhost:5000/app", "dev")`
/// - `localhost:5000/app` -> `("localhost:5000/app", "latest")`
pub fn split_image_tag(reference: &str) -> (String, String) {
    if let Some(pos) = reference.rfind(':') {
        let potential_tag = &reference[pos + 1..];
        if !potential_tag.contains('/') {
            return (reference[..pos].to_string(), potential_tag.to_string());
        }
    }

    (reference.to_string(), "latest".to_string())
}
