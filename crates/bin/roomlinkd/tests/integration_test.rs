//! End-to-end tests for the full roomlinkd stack.
//!
//! Each test wires the real WebSocket connector, session, dispatcher, store
//! and facade against two local gateway endpoints served by
//! `tokio-tungstenite`. The REST side is an in-memory backend.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

use roomlink_adapter_gateway_ws::{GatewayConfig, WsConnector};
use roomlink_app::encoder::CommandEncoder;
use roomlink_app::event_bus::InProcessEventBus;
use roomlink_app::facade::SyncFacade;
use roomlink_app::ports::BackendApi;
use roomlink_app::session::TransportSession;
use roomlink_domain::alert::{Alert, AlertPriority, AlertSeverity};
use roomlink_domain::connection::Channel;
use roomlink_domain::equipment::{Equipment, EquipmentKind, PowerStatus};
use roomlink_domain::error::SyncError;
use roomlink_domain::id::{AlertId, EquipmentId, RoomId, SensorId, UserId};
use roomlink_domain::room::Room;
use roomlink_domain::sensor::{NewSensor, Sensor, SensorPatch};
use roomlink_domain::user::{NewUser, User};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Gateway endpoint accepting a single client.
struct Gateway {
    url: String,
    /// Frames written by the client. Closes when the client disconnects.
    received: mpsc::UnboundedReceiver<String>,
    push: mpsc::UnboundedSender<String>,
}

impl Gateway {
    async fn serve(path: &str) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("ws://{}{path}", listener.local_addr().unwrap());
        let (received_tx, received) = mpsc::unbounded_channel();
        let (push, mut outgoing) = mpsc::unbounded_channel::<String>();
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let socket = tokio_tungstenite::accept_async(stream).await.unwrap();
            let (mut sink, mut source) = socket.split();
            loop {
                tokio::select! {
                    frame = source.next() => match frame {
                        Some(Ok(Message::Text(text))) => {
                            let _ = received_tx.send(text.as_str().to_owned());
                        }
                        Some(Ok(Message::Close(_)) | Err(_)) | None => break,
                        Some(Ok(_)) => {}
                    },
                    frame = outgoing.recv() => match frame {
                        Some(text) => {
                            if sink.send(Message::text(text)).await.is_err() {
                                break;
                            }
                        }
                        None => break,
                    },
                }
            }
        });
        Self {
            url,
            received,
            push,
        }
    }

    fn push(&self, frame: &str) {
        self.push.send(frame.to_string()).unwrap();
    }

    async fn next_frame(&mut self) -> Option<String> {
        tokio::time::timeout(Duration::from_secs(5), self.received.recv())
            .await
            .expect("gateway should receive a frame in time")
    }
}

/// Backend answering from fixed collections. Mutations succeed silently.
#[derive(Clone, Default)]
struct StaticBackend {
    equipment: Vec<Equipment>,
    rooms: Vec<Room>,
    alerts: Vec<Alert>,
}

impl BackendApi for StaticBackend {
    async fn fetch_sensors(&self) -> Result<Vec<Sensor>, SyncError> {
        Ok(Vec::new())
    }

    async fn fetch_equipment(&self) -> Result<Vec<Equipment>, SyncError> {
        Ok(self.equipment.clone())
    }

    async fn fetch_rooms(&self) -> Result<Vec<Room>, SyncError> {
        Ok(self.rooms.clone())
    }

    async fn fetch_users(&self) -> Result<Vec<User>, SyncError> {
        Ok(Vec::new())
    }

    async fn fetch_alerts(&self) -> Result<Vec<Alert>, SyncError> {
        Ok(self.alerts.clone())
    }

    async fn create_sensor(&self, _sensor: &NewSensor) -> Result<(), SyncError> {
        Ok(())
    }

    async fn update_sensor(&self, _patch: &SensorPatch) -> Result<(), SyncError> {
        Ok(())
    }

    async fn delete_sensor(&self, _id: &SensorId) -> Result<(), SyncError> {
        Ok(())
    }

    async fn delete_equipment(&self, _id: EquipmentId) -> Result<(), SyncError> {
        Ok(())
    }

    async fn delete_room(&self, _id: &RoomId) -> Result<(), SyncError> {
        Ok(())
    }

    async fn create_user(&self, _user: &NewUser) -> Result<(), SyncError> {
        Ok(())
    }

    async fn update_user(&self, _id: &UserId, _user: &NewUser) -> Result<(), SyncError> {
        Ok(())
    }

    async fn delete_user(&self, _id: &UserId) -> Result<(), SyncError> {
        Ok(())
    }

    async fn acknowledge_alert(&self, _id: &AlertId) -> Result<(), SyncError> {
        Ok(())
    }
}

fn backend() -> StaticBackend {
    StaticBackend {
        equipment: vec![
            Equipment::builder()
                .id(3)
                .name("Clim B12")
                .kind(EquipmentKind::Hvac)
                .location("B12", "1")
                .status(PowerStatus::Off)
                .controllable(true)
                .value(21.0)
                .build()
                .unwrap(),
        ],
        rooms: vec![Room {
            id: RoomId::new("1"),
            name: "Salle B12".to_string(),
            floor: "1".to_string(),
            area: 42.5,
            sensors: vec!["s1".to_string()],
            equipment: vec!["3".to_string()],
        }],
        alerts: vec![Alert::new(
            "a1",
            AlertSeverity::Warning,
            AlertPriority::Medium,
            "CO2 above threshold",
        )],
    }
}

fn stack(
    equipment: &Gateway,
    telemetry: &Gateway,
) -> SyncFacade<WsConnector, StaticBackend> {
    let config = GatewayConfig {
        equipment_url: equipment.url.clone(),
        sensor_url: telemetry.url.clone(),
        reconnect_base_delay_ms: 50,
        max_reconnect_attempts: 2,
        connect_timeout_secs: 5,
    };
    let (session, events) =
        TransportSession::new(WsConnector::new(config.clone()), config.session_config());
    SyncFacade::new(
        session,
        events,
        backend(),
        CommandEncoder::new("operator-7"),
        InProcessEventBus::new(256),
    )
}

async fn eventually(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition should hold in time");
}

// ---------------------------------------------------------------------------
// Population
// ---------------------------------------------------------------------------

#[tokio::test(flavor = "multi_thread")]
async fn should_populate_store_from_rest_and_telemetry() {
    let equipment = Gateway::serve("/ws/equipement").await;
    let mut telemetry = Gateway::serve("/ws/sensor").await;
    let facade = stack(&equipment, &telemetry);

    facade.start().await;

    assert_eq!(telemetry.next_frame().await.as_deref(), Some("\"get_sensors\""));
    assert_eq!(facade.store().equipment().len(), 1);
    assert_eq!(facade.store().rooms().len(), 1);
    assert_eq!(facade.store().active_alerts().len(), 1);

    telemetry.push(
        r#"{"type":"sensors_list","data":[{"id":"s1","name":"CO2 B12","type":"co2","value":780,"unit":"ppm","room":"B12","floor":1}]}"#,
    );
    eventually(|| facade.store().has_sensors()).await;
    telemetry.push(r#"{"type":"sensor_update","id":"s1","value":950}"#);
    eventually(|| {
        facade
            .store()
            .sensor(&SensorId::new("s1"))
            .is_some_and(|sensor| (sensor.value - 950.0).abs() < f64::EPSILON)
    })
    .await;

    facade.teardown().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn should_merge_equipment_updates_pushed_by_gateway() {
    let equipment = Gateway::serve("/ws/equipement").await;
    let telemetry = Gateway::serve("/ws/sensor").await;
    let facade = stack(&equipment, &telemetry);
    facade.start().await;

    equipment.push(r#"{"type":"equipment_update","id":"3","status":"on","value":19}"#);

    eventually(|| {
        facade
            .store()
            .equipment_item(EquipmentId::new(3))
            .is_some_and(|item| item.status == PowerStatus::On
                    && item.value.is_some_and(|value| (value - 19.0).abs() < f64::EPSILON))
    })
    .await;
    let item = facade.store().equipment_item(EquipmentId::new(3)).unwrap();
    assert_eq!(item.name, "Clim B12");
    assert!(item.controllable);

    facade.teardown().await;
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

#[tokio::test(flavor = "multi_thread")]
async fn should_send_toggle_command_and_apply_it_optimistically() {
    let mut equipment = Gateway::serve("/ws/equipement").await;
    let telemetry = Gateway::serve("/ws/sensor").await;
    let facade = stack(&equipment, &telemetry);
    facade.start().await;
    eventually(|| facade.connection_state(Channel::Equipment).is_open()).await;

    assert!(facade.toggle_equipment(EquipmentId::new(3)));

    assert_eq!(
        facade
            .store()
            .equipment_item(EquipmentId::new(3))
            .unwrap()
            .status,
        PowerStatus::On
    );
    let frame = equipment.next_frame().await.unwrap();
    let command: serde_json::Value = serde_json::from_str(&frame).unwrap();
    assert_eq!(command["type"], "command");
    assert_eq!(command["command"], "toggle");
    assert_eq!(command["target"], "equipment");
    assert_eq!(command["equipmentId"], 3);
    assert_eq!(command["userId"], "operator-7");
    assert_eq!(command["status"], "on");
    assert_eq!(command["payload"]["status"], "on");

    facade.teardown().await;
}

// ---------------------------------------------------------------------------
// Teardown
// ---------------------------------------------------------------------------

#[tokio::test(flavor = "multi_thread")]
async fn should_close_gateway_sockets_on_teardown() {
    let mut equipment = Gateway::serve("/ws/equipement").await;
    let telemetry = Gateway::serve("/ws/sensor").await;
    let facade = stack(&equipment, &telemetry);
    facade.start().await;
    eventually(|| facade.connection_state(Channel::Equipment).is_open()).await;

    facade.teardown().await;

    assert_eq!(equipment.next_frame().await, None);
    assert!(facade.store().is_closed());
    assert!(!facade.toggle_equipment(EquipmentId::new(3)));

    facade.teardown().await;
}
