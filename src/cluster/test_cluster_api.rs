#[cfg(test)]
mod tests {
    use crate::cluster::cluster_api::{ClusterApi, HttpClusterApi};
    use crate::cluster::cluster_error::ClusterError;
    use mockito::{mock, Matcher};
    use reqwest::{StatusCode, Url};

    const ECS: &str = "AmazonEC2ContainerServiceV20141113";

    fn api() -> HttpClusterApi {
        let base_url = Url::parse(&mockito::server_url()).unwrap();
        HttpClusterApi::new(base_url, None).unwrap()
    }

    #[tokio::test]
    async fn test_list_tasks_passes_cursor_and_page_size() {
        let _mock = mock("POST", "/")
            .match_header("x-amz-target", format!("{}.ListTasks", ECS).as_str())
            .match_header("content-type", "application/x-amz-json-1.1")
            .match_body(Matcher::JsonString(
                r#"{"cluster":"list-cluster","maxResults":25,"nextToken":"page-2"}"#.into(),
            ))
            .with_status(200)
            .with_body(r#"{"taskArns":["arn:task/1","arn:task/2"],"nextToken":"page-3"}"#)
            .create();

        let page = api()
            .list_tasks("list-cluster", 25, Some("page-2".into()))
            .await
            .unwrap();

        assert_eq!(page.ids, vec!["arn:task/1", "arn:task/2"]);
        assert_eq!(page.next_token.as_deref(), Some("page-3"));
    }

    #[tokio::test]
    async fn test_list_container_instances_last_page_has_no_cursor() {
        let _mock = mock("POST", "/")
            .match_header(
                "x-amz-target",
                format!("{}.ListContainerInstances", ECS).as_str(),
            )
            .match_body(Matcher::PartialJsonString(r#"{"cluster":"last-page"}"#.into()))
            .with_status(200)
            .with_body(r#"{"containerInstanceArns":["arn:ci/a"],"nextToken":""}"#)
            .create();

        let page = api()
            .list_container_instances("last-page", 100, None)
            .await
            .unwrap();

        assert_eq!(page.ids, vec!["arn:ci/a"]);
        assert_eq!(page.next_token, None);
    }

    #[tokio::test]
    async fn test_describe_tasks() {
        let _mock = mock("POST", "/")
            .match_header("x-amz-target", format!("{}.DescribeTasks", ECS).as_str())
            .match_body(Matcher::JsonString(
                r#"{"cluster":"describe-cluster","tasks":["arn:task/1"]}"#.into(),
            ))
            .with_status(200)
            .with_body(
                r#"{
                    "tasks": [{
                        "taskArn": "arn:task/1",
                        "taskDefinitionArn": "arn:task-definition/web:3",
                        "containerInstanceArn": "arn:ci/a",
                        "lastStatus": "RUNNING"
                    }],
                    "failures": [{"arn": "arn:task/2", "reason": "MISSING"}]
                }"#,
            )
            .create();

        let tasks = api()
            .describe_tasks("describe-cluster", vec!["arn:task/1".into()])
            .await
            .unwrap();

        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].task_definition_arn, "arn:task-definition/web:3");
        assert_eq!(tasks[0].container_instance_arn.as_deref(), Some("arn:ci/a"));
    }

    #[tokio::test]
    async fn test_describe_task_definition() {
        let _mock = mock("POST", "/")
            .match_header(
                "x-amz-target",
                format!("{}.DescribeTaskDefinition", ECS).as_str(),
            )
            .match_body(Matcher::JsonString(
                r#"{"taskDefinition":"arn:task-definition/api:9"}"#.into(),
            ))
            .with_status(200)
            .with_body(
                r#"{
                    "taskDefinition": {
                        "taskDefinitionArn": "arn:task-definition/api:9",
                        "family": "api",
                        "revision": 9,
                        "containerDefinitions": [
                            {"name": "app", "cpu": 256, "memory": 512},
                            {"name": "sidecar", "cpu": 0, "memoryReservation": 64}
                        ]
                    }
                }"#,
            )
            .create();

        let definition = api()
            .describe_task_definition("arn:task-definition/api:9")
            .await
            .unwrap();

        assert_eq!(definition.family, "api");
        assert_eq!(definition.revision, 9);
        assert_eq!(definition.container_definitions[1].effective_memory(), 64);
    }

    #[tokio::test]
    async fn test_describe_hosts_flattens_reservations() {
        let _mock = mock("POST", "/")
            .match_header("x-amz-target", "AmazonEC2.DescribeInstances")
            .match_body(Matcher::JsonString(r#"{"InstanceIds":["i-1","i-2"]}"#.into()))
            .with_status(200)
            .with_body(
                r#"{"reservations":[
                    {"instances":[{"instanceId":"i-1","privateIpAddress":"10.0.0.1"}]},
                    {"instances":[{"instanceId":"i-2","privateIpAddress":"10.0.0.2"}]}
                ]}"#,
            )
            .create();

        let hosts = api()
            .describe_hosts(vec!["i-1".into(), "i-2".into()])
            .await
            .unwrap();

        assert_eq!(hosts.len(), 2);
        assert_eq!(hosts[1].private_ip_address.as_deref(), Some("10.0.0.2"));
    }

    #[tokio::test]
    async fn test_throttled_response_is_classified() {
        let _mock = mock("POST", "/")
            .match_header("x-amz-target", format!("{}.ListTasks", ECS).as_str())
            .match_body(Matcher::PartialJsonString(r#"{"cluster":"throttled"}"#.into()))
            .with_status(400)
            .with_body(r#"{"__type":"ThrottlingException","message":"Rate exceeded"}"#)
            .create();

        let err = api().list_tasks("throttled", 100, None).await.unwrap_err();

        assert!(err.is_throttling());
        assert!(matches!(err, ClusterError::HttpError(StatusCode::BAD_REQUEST, _)));
    }

    #[tokio::test]
    async fn test_server_error_is_reported() {
        let _mock = mock("POST", "/")
            .match_header(
                "x-amz-target",
                format!("{}.DescribeContainerInstances", ECS).as_str(),
            )
            .match_body(Matcher::PartialJsonString(r#"{"cluster":"broken"}"#.into()))
            .with_status(500)
            .with_body("internal failure")
            .create();

        let err = api()
            .describe_container_instances("broken", vec!["arn:ci/a".into()])
            .await
            .unwrap_err();

        match err {
            ClusterError::HttpError(status, body) => {
                assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
                assert_eq!(body, "internal failure");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
